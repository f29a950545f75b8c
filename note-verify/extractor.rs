use crate::error::{VerifyError, VerifyResult};
use image::GrayImage;
use image::imageops::{self, FilterType};
use imageproc::filter::gaussian_blur_f32;
use note_brief::BriefGenerator;
use note_core::{Descriptor, DescriptorSet, ExtractorConfig, Image, Keypoint};
use note_fast::{FastDetector, LevelKeypoints};
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

/// Gaussian sigma applied to each level before sampling descriptors
const DESCRIPTOR_BLUR_SIGMA: f32 = 2.0;

/// Keypoint/descriptor extractor: normalizes resolution, detects oriented
/// FAST corners over a pyramid and describes them with steered BRIEF.
#[derive(Debug, Clone)]
pub struct NoteExtractor {
    detector: FastDetector,
    brief: BriefGenerator,
}

impl NoteExtractor {
    pub fn new(cfg: ExtractorConfig) -> VerifyResult<Self> {
        Ok(Self {
            detector: FastDetector::new(cfg)?,
            brief: BriefGenerator::new(),
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        self.detector.config()
    }

    /// Resize to the working resolution. Aspect ratio is not preserved.
    pub fn normalize(&self, image: &Image) -> VerifyResult<Image> {
        let (width, height) = self.detector.dimensions();
        if image.dimensions() == (width, height) {
            return Ok(image.clone());
        }
        let gray = to_gray_image(image)?;
        let resized = imageops::resize(&gray, width as u32, height as u32, FilterType::Triangle);
        from_gray_image(resized)
    }

    /// Extract up to `max_features` keypoints with descriptors, strongest first.
    ///
    /// Textureless input yields an empty set, as does a zero-sized image.
    pub fn extract(&self, image: &Image) -> VerifyResult<DescriptorSet> {
        if image.is_empty() {
            return Ok(DescriptorSet::empty());
        }

        let working = self.normalize(image)?;
        let levels = self.detector.detect(&working)?;

        let described: Vec<Vec<(Keypoint, Descriptor)>> = levels
            .into_par_iter()
            .map(|level| self.describe_level(level))
            .collect::<VerifyResult<_>>()?;

        let mut pairs: Vec<(Keypoint, Descriptor)> = described.into_iter().flatten().collect();
        pairs.sort_by(|a, b| b.0.response.partial_cmp(&a.0.response).unwrap_or(Ordering::Equal));
        pairs.truncate(self.config().max_features);

        debug!(keypoints = pairs.len(), "extracted descriptor set");
        Ok(DescriptorSet::from_pairs(pairs))
    }

    /// Describe a level's keypoints on its smoothed image and map them to working coordinates
    fn describe_level(&self, level: LevelKeypoints) -> VerifyResult<Vec<(Keypoint, Descriptor)>> {
        if level.keypoints.is_empty() {
            return Ok(Vec::new());
        }

        let smoothed = from_gray_image(gaussian_blur_f32(&to_gray_image(&level.image)?, DESCRIPTOR_BLUR_SIGMA))?;
        let descriptors = self.brief.generate_descriptors(&smoothed, &level.keypoints);
        let scale = level.level.scale;

        Ok(level
            .keypoints
            .into_iter()
            .map(|kp| Keypoint {
                x: kp.x * scale,
                y: kp.y * scale,
                ..kp
            })
            .zip(descriptors)
            .collect())
    }
}

pub(crate) fn to_gray_image(image: &Image) -> VerifyResult<GrayImage> {
    GrayImage::from_raw(image.width() as u32, image.height() as u32, image.as_raw().to_vec())
        .ok_or(VerifyError::InvalidBuffer)
}

pub(crate) fn from_gray_image(gray: GrayImage) -> VerifyResult<Image> {
    let (width, height) = gray.dimensions();
    Image::from_raw(width as usize, height as usize, gray.into_raw()).ok_or(VerifyError::InvalidBuffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{banknote_like, small_extractor_config};

    #[test]
    fn test_blank_image_yields_empty_set() {
        let extractor = NoteExtractor::new(small_extractor_config()).unwrap();
        let set = extractor.extract(&Image::filled(300, 150, 200)).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_zero_sized_image_yields_empty_set() {
        let extractor = NoteExtractor::new(small_extractor_config()).unwrap();
        let set = extractor.extract(&Image::filled(0, 0, 0)).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_textured_image_is_bounded_and_ranked() {
        let cfg = small_extractor_config();
        let extractor = NoteExtractor::new(cfg.clone()).unwrap();
        let set = extractor.extract(&banknote_like(320, 160, 7)).unwrap();
        assert!(!set.is_empty());
        assert!(set.len() <= cfg.max_features);
        assert_eq!(set.keypoints().len(), set.descriptors().len());
        assert!(set.keypoints().windows(2).all(|w| w[0].response >= w[1].response));
        for kp in set.keypoints() {
            assert!(kp.x >= 0.0 && kp.x < cfg.working_width as f32);
            assert!(kp.y >= 0.0 && kp.y < cfg.working_height as f32);
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = NoteExtractor::new(small_extractor_config()).unwrap();
        let img = banknote_like(320, 160, 3);
        assert_eq!(extractor.extract(&img).unwrap(), extractor.extract(&img).unwrap());
    }

    #[test]
    fn test_normalize_resizes_to_working_resolution() {
        let cfg = small_extractor_config();
        let extractor = NoteExtractor::new(cfg.clone()).unwrap();
        let out = extractor.normalize(&banknote_like(123, 457, 1)).unwrap();
        assert_eq!(out.dimensions(), (cfg.working_width, cfg.working_height));
    }

    #[test]
    fn test_source_resolution_does_not_matter_for_identical_content() {
        // Same picture at two sizes is normalized to the same working image
        let extractor = NoteExtractor::new(small_extractor_config()).unwrap();
        let img = banknote_like(320, 160, 5);
        let a = extractor.extract(&img).unwrap();
        let b = extractor.extract(&extractor.normalize(&img).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
