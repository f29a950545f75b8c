use note_core::Image;
use crate::types::{CornerType, ScoredCorner};
use crate::utils::{circle_mask, has_contiguous_arc};
use rayon::prelude::*;

/// Corner detection algorithms (FAST and Harris)
pub struct CornerDetector;

impl CornerDetector {
    /// FAST circle offsets (radius 3 Bresenham circle, clockwise from the top)
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Contiguous arc length required by FAST-9
    pub const ARC_LENGTH: usize = 9;

    /// Smallest border that keeps the circle and the Harris window inside the image
    pub const MIN_BORDER: usize = 3;

    /// Detect FAST-9 corners at least `border` pixels away from the image edge,
    /// scored with the Harris response. Rows are processed in parallel.
    pub fn detect_corners(img: &Image, threshold: u8, border: usize) -> Vec<ScoredCorner> {
        let (width, height) = img.dimensions();
        let border = border.max(Self::MIN_BORDER);
        if width <= 2 * border || height <= 2 * border {
            return Vec::new();
        }

        (border..height - border)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row = Vec::new();
                for x in border..width - border {
                    if Self::is_fast_corner(img, x, y, threshold) {
                        row.push(ScoredCorner {
                            x,
                            y,
                            response: Self::compute_harris_response(img, x, y),
                        });
                    }
                }
                row
            })
            .collect()
    }

    #[inline]
    fn classify(pixel: u8, center: u8, threshold: u8) -> CornerType {
        if pixel as i16 >= center as i16 + threshold as i16 {
            CornerType::Bright
        } else if pixel as i16 <= center as i16 - threshold as i16 {
            CornerType::Dark
        } else {
            CornerType::None
        }
    }

    /// FAST-9 segment test on the 16-pixel circle
    pub fn is_fast_corner(img: &Image, x: usize, y: usize, threshold: u8) -> bool {
        let center = img.get(x, y);
        let (cx, cy) = (x as i32, y as i32);

        // Any arc of 9 covers at least two of the four compass pixels
        let mut bright = 0;
        let mut dark = 0;
        for &i in &[0usize, 4, 8, 12] {
            let (dx, dy) = Self::FAST_OFFSETS[i];
            match Self::classify(img.get_clamped(cx + dx, cy + dy), center, threshold) {
                CornerType::Bright => bright += 1,
                CornerType::Dark => dark += 1,
                CornerType::None => {}
            }
        }
        if bright < 2 && dark < 2 {
            return false;
        }

        let mut circle = [CornerType::None; 16];
        for (slot, &(dx, dy)) in circle.iter_mut().zip(Self::FAST_OFFSETS.iter()) {
            *slot = Self::classify(img.get_clamped(cx + dx, cy + dy), center, threshold);
        }

        has_contiguous_arc(circle_mask(&circle, CornerType::Bright), Self::ARC_LENGTH)
            || has_contiguous_arc(circle_mask(&circle, CornerType::Dark), Self::ARC_LENGTH)
    }

    /// Harris corner response over a 5x5 window of Sobel gradients
    pub fn compute_harris_response(img: &Image, x: usize, y: usize) -> f32 {
        let (width, height) = img.dimensions();
        if x < 3 || y < 3 || x + 3 >= width || y + 3 >= height {
            return 0.0;
        }

        let mut ixx = 0.0f64;
        let mut ixy = 0.0f64;
        let mut iyy = 0.0f64;

        for dy in -2i32..=2 {
            for dx in -2i32..=2 {
                let nx = (x as i32 + dx) as usize;
                let ny = (y as i32 + dy) as usize;
                let (gx, gy) = Self::compute_gradients(img, nx, ny);
                ixx += (gx * gx) as f64;
                ixy += (gx * gy) as f64;
                iyy += (gy * gy) as f64;
            }
        }

        // det(M) - k * trace(M)^2
        let k = 0.04f64;
        let det = ixx * iyy - ixy * ixy;
        let trace = ixx + iyy;
        let harris_response = det - k * trace * trace;

        if harris_response > 0.0 {
            harris_response as f32
        } else {
            0.0
        }
    }

    /// Sobel gradients; caller guarantees a one-pixel margin
    fn compute_gradients(img: &Image, x: usize, y: usize) -> (f32, f32) {
        let p = |xx: usize, yy: usize| img.get(xx, yy) as f32;

        let gx = p(x + 1, y - 1) + 2.0 * p(x + 1, y) + p(x + 1, y + 1)
            - p(x - 1, y - 1) - 2.0 * p(x - 1, y) - p(x - 1, y + 1);

        let gy = p(x - 1, y + 1) + 2.0 * p(x, y + 1) + p(x + 1, y + 1)
            - p(x - 1, y - 1) - 2.0 * p(x, y - 1) - p(x + 1, y - 1);

        (gx / 8.0, gy / 8.0)
    }
}
