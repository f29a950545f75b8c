#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale image with its dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Image {
    /// Wrap a row-major buffer; `None` when the length does not match `width * height`
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
        if data.len() != width * height {
            return None;
        }
        Some(Self { width, height, data })
    }

    /// Image where every sample has the same intensity
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build an image by evaluating `f(x, y)` for every pixel
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Sample with coordinates clamped to the image border
    #[inline]
    pub fn get_clamped(&self, x: i32, y: i32) -> u8 {
        let xx = x.clamp(0, self.width as i32 - 1) as usize;
        let yy = y.clamp(0, self.height as i32 - 1) as usize;
        self.data[yy * self.width + xx]
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }
}

/// Key-point ≙ FAST corner + orientation (radians), in working-resolution coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    /// Harris corner response, used for saliency ranking
    pub response: f32,
    /// Pyramid level the corner was found on
    pub octave: u8,
    /// Diameter of the described patch, scaled to level 0
    pub size: f32,
}

/// Number of bytes in a descriptor
pub const DESCRIPTOR_BYTES: usize = 32;

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// Number of differing bits between two descriptors (0..=256)
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Keypoints and their descriptors from one extraction, ordered by saliency
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorSet {
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl DescriptorSet {
    /// Pair keypoints with descriptors; `None` when the lengths differ
    pub fn new(keypoints: Vec<Keypoint>, descriptors: Vec<Descriptor>) -> Option<Self> {
        if keypoints.len() != descriptors.len() {
            return None;
        }
        Some(Self {
            keypoints,
            descriptors,
        })
    }

    /// Collect (keypoint, descriptor) pairs, preserving their order
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Keypoint, Descriptor)>) -> Self {
        let (keypoints, descriptors) = pairs.into_iter().unzip();
        Self {
            keypoints,
            descriptors,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Keypoint, &Descriptor)> {
        self.keypoints.iter().zip(self.descriptors.iter())
    }
}

/// Correspondence between a query descriptor and a reference descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub query_idx: usize,
    pub reference_idx: usize,
    pub distance: u32,
}

/// Similarity of a candidate against one reference
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Score {
    pub match_count: usize,
    /// Percentage of the candidate's own keypoints that matched, in [0, 100]
    pub match_ratio: f64,
}

impl Score {
    pub const ZERO: Score = Score {
        match_count: 0,
        match_ratio: 0.0,
    };
}

/// Keypoint/descriptor extraction settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExtractorConfig {
    /// Upper bound on keypoints per image
    pub max_features: usize,
    /// Every image is resized to this resolution before detection
    pub working_width: usize,
    pub working_height: usize,
    /// FAST intensity threshold
    pub fast_threshold: u8,
    /// Diameter of the orientation/descriptor patch
    pub patch_size: usize,
    /// Corners closer than this to a level's border are ignored
    pub edge_threshold: usize,
    pub n_levels: usize,
    pub scale_factor: f32,
    pub n_threads: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            working_width: 800,
            working_height: 400,
            fast_threshold: 20,
            patch_size: 31,
            edge_threshold: 31,
            n_levels: 8,
            scale_factor: 1.2,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
