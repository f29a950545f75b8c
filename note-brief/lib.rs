use note_core::{DESCRIPTOR_BYTES, Descriptor, Image, Keypoint};
use rayon::prelude::*;

/// 256 point-pair intensity tests inside a 31x31 patch (offsets within ±13),
/// one bit each, packed least-significant bit first.
const PATTERN: [(i8, i8, i8, i8); 256] = [
    (8, -3, 9, 5), (-11, 9, -8, 2), (3, -12, -13, 2), (-3, -7, -4, 5),
    (1, -11, 12, -2), (1, -1, 11, -1), (4, -2, -5, -8), (2, -13, -8, 9),
    (-11, 1, 6, 2), (11, 11, 12, -1), (6, -12, -9, -8), (12, 5, 3, -6),
    (1, 1, -4, -1), (7, -4, -6, 7), (-3, 2, 9, -8), (-4, -8, 3, 3),
    (-5, 3, 0, -4), (2, -11, -13, 0), (10, 5, 5, 2), (0, 9, 10, -3),
    (5, -8, -10, 1), (8, 3, -8, -5), (2, -6, -9, -4), (-12, 2, 0, -10),
    (5, -10, -7, -2), (-7, 9, -1, 0), (0, -1, -3, 3), (-12, 5, -2, -1),
    (-1, 1, -5, -11), (-1, 2, -3, 0), (-5, -6, 7, -1), (4, 7, 0, -8),
    (-9, 9, 3, -13), (7, -3, 13, -7), (10, -4, -5, 3), (6, 1, -13, -13),
    (-12, -11, 7, 0), (0, -1, -8, -6), (-10, -5, -6, 7), (10, 2, -6, -12),
    (-11, 8, 4, -2), (9, 0, -11, -4), (0, 11, 6, -11), (4, 1, -10, -3),
    (-6, 12, 1, 12), (-4, -8, 8, -7), (-3, 0, 8, 3), (3, 3, -3, -1),
    (-6, -11, -2, 12), (0, -3, -6, -3), (-6, 3, -12, -8), (6, 3, -2, -10),
    (-3, -10, -1, 0), (11, 2, 11, 3), (1, -8, -10, 8), (2, -2, -7, 8),
    (0, -13, 13, 0), (6, -9, -1, -1), (7, 5, 6, 3), (-13, 7, -7, -7),
    (-5, -13, 5, -11), (6, 7, -2, 12), (-6, -11, 8, 6), (-2, -2, -5, 9),
    (5, 4, 7, -6), (0, 11, -4, -5), (10, 1, 2, -8), (-3, -10, -10, -10),
    (1, 9, 6, -5), (-7, -11, 11, 3), (11, -2, -4, 3), (7, -1, 5, 12),
    (-5, 5, -2, -5), (8, -11, -1, -13), (-13, 2, -11, -8), (-2, 9, 5, 0),
    (2, -5, 2, 0), (3, -13, -12, 9), (6, -3, 5, 4), (10, 10, 1, -9),
    (-13, -8, -4, 10), (2, -2, -3, 8), (-13, -11, -8, -3), (2, -4, -7, -3),
    (12, 0, -2, 13), (-11, 7, -10, -1), (-5, -10, 0, -11), (6, 7, 12, -3),
    (-1, -1, 8, -6), (-6, 3, -1, -3), (-2, -11, -11, -3), (12, -2, 3, -10),
    (-11, -1, -2, -8), (3, -1, 7, 3), (2, -2, -12, 12), (6, -4, 12, -2),
    (-3, 11, 2, -12), (-1, 3, 2, 3), (1, 3, -11, -3), (2, -8, -7, -5),
    (0, -5, -11, -6), (-12, 8, -2, 9), (3, -7, 9, -8), (-10, -6, -1, -11),
    (11, -6, -3, -13), (3, 0, 0, -8), (-5, -2, -1, -13), (-8, -5, -10, -13),
    (7, -13, 0, -3), (1, -4, -1, -13), (6, -5, -7, 8), (8, 7, -5, -13),
    (2, 0, -8, -6), (-8, -3, -13, -6), (-6, 5, 0, 6), (-8, 8, -9, 1),
    (10, 1, -9, 4), (-4, -8, -5, 7), (7, 7, 10, -8), (-7, -3, -1, 1),
    (10, -1, 3, 1), (5, 6, -10, -8), (-6, -13, 5, -8), (4, -3, -4, -13),
    (-3, 4, -2, -13), (10, -11, 9, 11), (-9, 0, 12, 2), (-4, -2, 13, -6),
    (2, -10, -6, 1), (11, -13, 4, -13), (1, -1, 1, 9), (1, -5, -13, -5),
    (7, 4, 12, -7), (0, -2, -8, 3), (7, 2, 2, -8), (-2, 7, -12, -4),
    (1, 11, 6, -2), (-1, -1, -4, 10), (0, 8, 0, -13), (3, 12, 5, -13),
    (-9, -1, 9, -13), (12, 4, -6, -4), (-13, 13, 1, -4), (0, -2, -7, -9),
    (10, -8, -13, 3), (2, -13, 6, 8), (10, -6, -7, 0), (-11, 7, -1, -7),
    (12, 0, 5, -4), (-7, -8, 4, -12), (-13, 5, -5, -2), (0, 5, 4, 4),
    (-2, -11, -1, 8), (9, 3, -1, -12), (0, 6, -10, 12), (1, -8, -7, -10),
    (-6, 4, -6, 3), (5, 1, -3, -9), (-6, 6, -6, 3), (7, -8, 1, -7),
    (3, 8, -9, -5), (2, -4, 5, 7), (11, 4, 6, -3), (-8, -1, 11, -1),
    (-3, -6, -10, -8), (2, 7, 3, -12), (-4, -10, 12, -3), (1, -2, -4, 6),
    (3, 11, -11, 0), (-6, 2, 3, -8), (6, 12, 0, -13), (3, 2, -2, -5),
    (-4, 1, -6, 5), (-12, 0, -13, 9), (-6, 2, 7, -8), (-2, -4, -6, 5),
    (0, 0, 0, -13), (9, -13, -2, 0), (3, -13, 5, -12), (10, 11, -13, -13),
    (-2, 3, -12, 3), (11, 7, -7, 0), (12, 2, 1, -13), (12, -11, 12, -8),
    (-7, -2, -4, -7), (7, 5, -1, -13), (-5, -8, -9, 10), (6, 0, -3, -13),
    (12, 4, -13, 1), (-7, 8, 8, -3), (10, -4, 0, -13), (2, 1, -7, 0),
    (-5, 4, 2, -8), (12, 8, 4, -13), (8, 7, -10, 0), (-3, 6, -2, 4),
    (-5, -1, -8, -12), (4, -1, -2, -10), (6, -4, -13, 9), (-7, 8, -6, -12),
    (-10, 2, -13, 10), (-1, -7, 0, 2), (-5, 6, -5, -12), (6, -13, 7, -3),
    (-13, 2, -1, 8), (2, 8, -13, 0), (-6, -9, 1, -4), (-9, 13, 0, -13),
    (-2, -3, 8, 0), (4, 0, -11, 12), (0, 3, -10, 10), (-6, -9, -3, -2),
    (9, -4, -6, 2), (5, 0, -13, -10), (-3, -8, -13, 3), (-12, -1, -4, -2),
    (7, -9, -4, 3), (-8, -4, 1, 11), (11, 6, 2, -12), (6, 6, -8, 12),
    (-3, -8, 2, -10), (2, 5, -8, 8), (-9, 8, -6, -8), (-4, 0, -11, -7),
    (7, 6, -3, 8), (-5, 7, -12, 5), (2, -8, -5, 1), (0, 4, -5, -3),
    (9, -9, -6, -12), (0, -13, 1, -13), (-7, -11, -3, -13), (6, -12, -7, 10),
    (6, -8, -13, 7), (8, 7, -11, -1), (-11, -5, -6, 9), (6, 4, 2, -13),
    (-1, -6, 3, -9), (1, -4, 4, -3), (-6, 8, -12, 0), (-11, 3, -6, 2),
    (7, -10, 11, -6), (5, 0, 12, -13), (4, -8, 1, -1), (-13, 12, -6, 3),
    (1, 4, -9, -2), (-8, -12, -8, 7), (-9, 5, 0, -5), (9, 7, 5, 3),
    (-12, -2, 8, -8), (3, 7, 12, -8), (-13, 3, -1, -1), (-10, -4, -10, 12),
    (5, -2, 0, 13), (-7, 1, -12, 8), (2, 9, -5, -11), (11, -13, 0, 2),
];

/// Rotation-aware BRIEF descriptor generator
#[derive(Debug, Clone, Copy, Default)]
pub struct BriefGenerator;

impl BriefGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Compute one descriptor per keypoint. `smoothed` must be the
    /// (pre-blurred) image the keypoint coordinates refer to.
    pub fn generate_descriptors(&self, smoothed: &Image, kps: &[Keypoint]) -> Vec<Descriptor> {
        kps.par_iter()
            .map(|kp| self.describe(smoothed, kp))
            .collect()
    }

    /// Steered BRIEF for a single keypoint
    pub fn describe(&self, smoothed: &Image, kp: &Keypoint) -> Descriptor {
        let (s, c) = kp.angle.sin_cos();
        let (cx, cy) = (kp.x, kp.y);
        let mut d = [0u8; DESCRIPTOR_BYTES];

        for (i, &(dx1, dy1, dx2, dy2)) in PATTERN.iter().enumerate() {
            let (dx1, dy1, dx2, dy2) = (dx1 as f32, dy1 as f32, dx2 as f32, dy2 as f32);

            // Rotate the test pair by the keypoint orientation
            let (rx1, ry1) = (cx + c * dx1 - s * dy1, cy + s * dx1 + c * dy1);
            let (rx2, ry2) = (cx + c * dx2 - s * dy2, cy + s * dx2 + c * dy2);

            let val1 = bilinear_sample(smoothed, rx1, ry1);
            let val2 = bilinear_sample(smoothed, rx2, ry2);

            let bit = (val1 < val2) as u8;
            d[i / 8] |= bit << (i % 8);
        }
        d
    }
}

/// Bilinear interpolation with samples outside the image clamped to its border
fn bilinear_sample(img: &Image, x: f32, y: f32) -> f32 {
    let (w, h) = img.dimensions();
    let x0 = x.floor();
    let y0 = y.floor();
    let x1 = x0 + 1.0;
    let y1 = y0 + 1.0;

    if x0 < 0.0 || y0 < 0.0 || x1 >= w as f32 || y1 >= h as f32 {
        return img.get_clamped(x.round() as i32, y.round() as i32) as f32;
    }

    let dx = x - x0;
    let dy = y - y0;
    let (x0, y0, x1, y1) = (x0 as usize, y0 as usize, x1 as usize, y1 as usize);

    let p00 = img.get(x0, y0) as f32;
    let p10 = img.get(x1, y0) as f32;
    let p01 = img.get(x0, y1) as f32;
    let p11 = img.get(x1, y1) as f32;

    let top = p00 * (1.0 - dx) + p10 * dx;
    let bottom = p01 * (1.0 - dx) + p11 * dx;

    top * (1.0 - dy) + bottom * dy
}
