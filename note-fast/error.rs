use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FastError {
    #[error("Invalid working resolution: {width}x{height} (must be > 0)")]
    InvalidImageSize { width: usize, height: usize },

    #[error("Image {width}x{height} does not match the detector resolution {expected_width}x{expected_height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("Invalid threshold: {0} (must be 1-127)")]
    InvalidThreshold(u8),

    #[error("Patch size {patch_size} must be odd and at least 7")]
    InvalidPatchSize { patch_size: usize },

    #[error("Edge threshold {edge_threshold} leaves no room for detection in a {width}x{height} image")]
    ImageTooSmall {
        width: usize,
        height: usize,
        edge_threshold: usize,
    },

    #[error("Invalid pyramid: {n_levels} levels with scale factor {scale_factor}")]
    InvalidPyramid { n_levels: usize, scale_factor: f32 },

    #[error("max_features must be at least 1")]
    NoFeatureBudget,
}

pub type FastResult<T> = Result<T, FastError>;
