use note_core::{ExtractorConfig, Image};
use crate::types::ScaleLevel;

/// Image pyramid operations for multi-scale feature detection
pub struct ImagePyramid;

impl ImagePyramid {
    /// Generate scale levels for the configured working resolution.
    ///
    /// Levels whose size leaves no room inside `border` are dropped. The
    /// feature budget is split geometrically so that coarser levels get
    /// proportionally fewer keypoints; the quotas sum to `max_features`.
    pub fn generate_scale_levels(cfg: &ExtractorConfig, border: usize) -> Vec<ScaleLevel> {
        let mut levels = Vec::new();
        let mut current_scale = 1.0f32;

        for level in 0..cfg.n_levels {
            let scaled_width = ((cfg.working_width as f32) / current_scale).round() as usize;
            let scaled_height = ((cfg.working_height as f32) / current_scale).round() as usize;

            if scaled_width <= 2 * border || scaled_height <= 2 * border {
                break;
            }

            levels.push(ScaleLevel {
                level,
                scale: current_scale,
                width: scaled_width,
                height: scaled_height,
                quota: 0,
            });

            current_scale *= cfg.scale_factor;
        }

        Self::assign_quotas(&mut levels, cfg.max_features, cfg.scale_factor);
        levels
    }

    fn assign_quotas(levels: &mut [ScaleLevel], max_features: usize, scale_factor: f32) {
        let n = levels.len();
        if n == 0 {
            return;
        }

        let factor = 1.0 / scale_factor as f64;
        let mut per_level = if (1.0 - factor).abs() < f64::EPSILON {
            max_features as f64 / n as f64
        } else {
            max_features as f64 * (1.0 - factor) / (1.0 - factor.powi(n as i32))
        };

        let mut assigned = 0usize;
        for level in levels.iter_mut().take(n - 1) {
            let quota = (per_level.round() as usize).min(max_features - assigned);
            level.quota = quota;
            assigned += quota;
            per_level *= factor;
        }
        levels[n - 1].quota = max_features - assigned;
    }

    /// Build image pyramid from base image
    pub fn build_image_pyramid(img: &Image, scale_levels: &[ScaleLevel]) -> Vec<Image> {
        scale_levels
            .iter()
            .map(|scale_level| {
                if scale_level.level == 0 && img.dimensions() == (scale_level.width, scale_level.height) {
                    img.clone()
                } else {
                    Self::downsample_image(img, scale_level.width, scale_level.height)
                }
            })
            .collect()
    }

    /// Resample image using pixel-center aligned bilinear interpolation
    fn downsample_image(img: &Image, target_width: usize, target_height: usize) -> Image {
        let (src_width, src_height) = img.dimensions();
        let x_ratio = src_width as f32 / target_width as f32;
        let y_ratio = src_height as f32 / target_height as f32;

        Image::from_fn(target_width, target_height, |x, y| {
            let src_x = ((x as f32 + 0.5) * x_ratio - 0.5).max(0.0);
            let src_y = ((y as f32 + 0.5) * y_ratio - 0.5).max(0.0);
            Self::bilinear_sample(img, src_x, src_y).round().clamp(0.0, 255.0) as u8
        })
    }

    /// Sample image at fractional coordinates using bilinear interpolation
    fn bilinear_sample(img: &Image, x: f32, y: f32) -> f32 {
        let (width, height) = img.dimensions();
        let x1 = (x.floor() as usize).min(width - 1);
        let y1 = (y.floor() as usize).min(height - 1);
        let x2 = (x1 + 1).min(width - 1);
        let y2 = (y1 + 1).min(height - 1);

        let fx = x - x1 as f32;
        let fy = y - y1 as f32;

        let p11 = img.get(x1, y1) as f32;
        let p12 = img.get(x2, y1) as f32;
        let p21 = img.get(x1, y2) as f32;
        let p22 = img.get(x2, y2) as f32;

        let interpolated_top = p11 * (1.0 - fx) + p12 * fx;
        let interpolated_bottom = p21 * (1.0 - fx) + p22 * fx;

        interpolated_top * (1.0 - fy) + interpolated_bottom * fy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels_and_quotas() {
        let cfg = ExtractorConfig::default();
        let levels = ImagePyramid::generate_scale_levels(&cfg, 31);
        assert_eq!(levels.len(), 8);
        assert_eq!(levels[0].width, 800);
        assert_eq!(levels[0].height, 400);
        assert!(levels.windows(2).all(|w| w[1].width < w[0].width));
        assert_eq!(levels.iter().map(|l| l.quota).sum::<usize>(), cfg.max_features);
        assert!(levels[0].quota > levels[7].quota);
    }

    #[test]
    fn test_small_resolution_drops_levels() {
        let cfg = ExtractorConfig {
            working_width: 100,
            working_height: 80,
            ..ExtractorConfig::default()
        };
        let levels = ImagePyramid::generate_scale_levels(&cfg, 31);
        // 80 / 1.2 = 67 > 62, 80 / 1.44 = 56 <= 62
        assert_eq!(levels.len(), 2);
        assert_eq!(levels.iter().map(|l| l.quota).sum::<usize>(), cfg.max_features);
    }

    #[test]
    fn test_single_level_gets_whole_budget() {
        let cfg = ExtractorConfig {
            n_levels: 1,
            max_features: 123,
            ..ExtractorConfig::default()
        };
        let levels = ImagePyramid::generate_scale_levels(&cfg, 31);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].quota, 123);
    }

    #[test]
    fn test_pyramid_dimensions_and_flat_content() {
        let cfg = ExtractorConfig::default();
        let levels = ImagePyramid::generate_scale_levels(&cfg, 31);
        let img = Image::filled(800, 400, 77);
        let pyramid = ImagePyramid::build_image_pyramid(&img, &levels);
        for (lvl, level_img) in levels.iter().zip(pyramid.iter()) {
            assert_eq!(level_img.dimensions(), (lvl.width, lvl.height));
            assert!(level_img.as_raw().iter().all(|&v| v == 77));
        }
    }
}
