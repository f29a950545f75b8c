use note_core::{ExtractorConfig, Image, Keypoint};
use crate::corner_detection::CornerDetector;
use crate::error::{FastError, FastResult};
use crate::pyramid::ImagePyramid;
use crate::refinement::KeypointRefinement;
use crate::types::{LevelKeypoints, ScaleLevel};
use rayon::prelude::*;
use tracing::debug;

/// Multi-scale FAST detector working at a fixed resolution
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: ExtractorConfig,
    border: usize,
    scale_levels: Vec<ScaleLevel>,
}

impl FastDetector {
    /// Creates a new FAST detector with validation
    pub fn new(cfg: ExtractorConfig) -> FastResult<Self> {
        let (width, height) = (cfg.working_width, cfg.working_height);
        if width == 0 || height == 0 {
            return Err(FastError::InvalidImageSize { width, height });
        }

        // 0 would flag every pixel, >127 overflows the signed comparison range
        if cfg.fast_threshold == 0 || cfg.fast_threshold > 127 {
            return Err(FastError::InvalidThreshold(cfg.fast_threshold));
        }

        if cfg.patch_size % 2 == 0 || cfg.patch_size < 7 {
            return Err(FastError::InvalidPatchSize { patch_size: cfg.patch_size });
        }

        if cfg.max_features == 0 {
            return Err(FastError::NoFeatureBudget);
        }

        if cfg.n_levels == 0 || !cfg.scale_factor.is_finite() || cfg.scale_factor < 1.0 {
            return Err(FastError::InvalidPyramid {
                n_levels: cfg.n_levels,
                scale_factor: cfg.scale_factor,
            });
        }

        let border = cfg.edge_threshold.max(CornerDetector::MIN_BORDER);
        if width <= 2 * border || height <= 2 * border {
            return Err(FastError::ImageTooSmall {
                width,
                height,
                edge_threshold: cfg.edge_threshold,
            });
        }

        let scale_levels = ImagePyramid::generate_scale_levels(&cfg, border);

        Ok(Self {
            cfg,
            border,
            scale_levels,
        })
    }

    /// Detect oriented keypoints on every pyramid level.
    ///
    /// `img` must already be at the working resolution. Keypoint coordinates
    /// in the result are level pixels; multiply by the level scale to map
    /// them back to the working resolution.
    pub fn detect(&self, img: &Image) -> FastResult<Vec<LevelKeypoints>> {
        if img.dimensions() != (self.cfg.working_width, self.cfg.working_height) {
            return Err(FastError::DimensionMismatch {
                width: img.width(),
                height: img.height(),
                expected_width: self.cfg.working_width,
                expected_height: self.cfg.working_height,
            });
        }

        let pyramid = ImagePyramid::build_image_pyramid(img, &self.scale_levels);

        let levels = self
            .scale_levels
            .par_iter()
            .zip(pyramid.into_par_iter())
            .map(|(scale_level, level_img)| {
                let keypoints = self.detect_at_level(&level_img, scale_level);
                LevelKeypoints {
                    level: *scale_level,
                    image: level_img,
                    keypoints,
                }
            })
            .collect();

        Ok(levels)
    }

    /// FAST + Harris ranking + NMS + orientation on a single level
    fn detect_at_level(&self, img: &Image, scale_level: &ScaleLevel) -> Vec<Keypoint> {
        let corners = CornerDetector::detect_corners(img, self.cfg.fast_threshold, self.border);
        let n_corners = corners.len();
        let suppressed = KeypointRefinement::suppress_non_maxima(&corners, img.width(), img.height());
        let best = KeypointRefinement::retain_best(suppressed, scale_level.quota);

        debug!(
            level = scale_level.level,
            corners = n_corners,
            kept = best.len(),
            quota = scale_level.quota,
            "FAST level done"
        );

        let size = self.cfg.patch_size as f32 * scale_level.scale;
        best.into_iter()
            .map(|c| Keypoint {
                x: c.x as f32,
                y: c.y as f32,
                angle: KeypointRefinement::compute_orientation(img, c.x, c.y, self.cfg.patch_size),
                response: c.response,
                octave: scale_level.level as u8,
                size,
            })
            .collect()
    }

    /// Get scale levels for this detector
    pub fn scale_levels(&self) -> &[ScaleLevel] {
        &self.scale_levels
    }

    /// Get detector configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.cfg
    }

    /// Working resolution (width, height)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cfg.working_width, self.cfg.working_height)
    }
}
