use note_core::{Image, Keypoint};

/// Corner location on a pyramid level with its Harris response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCorner {
    pub x: usize,
    pub y: usize,
    pub response: f32,
}

/// Scale information for pyramid levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLevel {
    pub level: usize,
    pub scale: f32,
    pub width: usize,
    pub height: usize,
    /// How many keypoints this level may contribute
    pub quota: usize,
}

/// Detections on one pyramid level. Keypoint coordinates are in level pixels.
#[derive(Debug, Clone)]
pub struct LevelKeypoints {
    pub level: ScaleLevel,
    pub image: Image,
    pub keypoints: Vec<Keypoint>,
}

/// Which side of the center intensity a circle pixel falls on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CornerType {
    Bright,
    Dark,
    None,
}
