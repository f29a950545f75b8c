use note_core::Image;
use crate::types::ScoredCorner;
use std::cmp::Ordering;

/// Corner pruning and orientation computation
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// 3x3 non-maximum suppression on the corner response map.
    ///
    /// A corner survives when no 8-neighbour corner has a larger response.
    /// Equal responses keep the neighbour that comes first in raster order.
    pub fn suppress_non_maxima(corners: &[ScoredCorner], width: usize, height: usize) -> Vec<ScoredCorner> {
        if corners.is_empty() {
            return Vec::new();
        }

        let mut response_map = vec![f32::NEG_INFINITY; width * height];
        for c in corners {
            response_map[c.y * width + c.x] = c.response;
        }

        corners
            .iter()
            .filter(|c| {
                let own_idx = c.y * width + c.x;
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = c.x as i32 + dx;
                        let ny = c.y as i32 + dy;
                        if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                            continue;
                        }
                        let n_idx = ny as usize * width + nx as usize;
                        let other = response_map[n_idx];
                        if other > c.response || (other == c.response && n_idx < own_idx) {
                            return false;
                        }
                    }
                }
                true
            })
            .copied()
            .collect()
    }

    /// Keep the `n` strongest corners, ordered by descending response.
    /// Ties are broken by raster position so the result is deterministic.
    pub fn retain_best(mut corners: Vec<ScoredCorner>, n: usize) -> Vec<ScoredCorner> {
        corners.sort_by(|a, b| {
            b.response
                .partial_cmp(&a.response)
                .unwrap_or(Ordering::Equal)
                .then(a.y.cmp(&b.y))
                .then(a.x.cmp(&b.x))
        });
        corners.truncate(n);
        corners
    }

    /// Orientation by intensity centroid over a circular patch of the given diameter
    pub fn compute_orientation(img: &Image, x: usize, y: usize, patch_size: usize) -> f32 {
        let half = (patch_size / 2) as i32;
        let (cx, cy) = (x as i32, y as i32);
        let radius_sq = half * half;

        let mut m10 = 0i64;
        let mut m01 = 0i64;

        for dy in -half..=half {
            for dx in -half..=half {
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let val = img.get_clamped(cx + dx, cy + dy) as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner(x: usize, y: usize, response: f32) -> ScoredCorner {
        ScoredCorner { x, y, response }
    }

    #[test]
    fn test_nms_keeps_local_maximum() {
        let corners = vec![corner(5, 5, 10.0), corner(6, 5, 20.0), corner(9, 9, 1.0)];
        let kept = KeypointRefinement::suppress_non_maxima(&corners, 16, 16);
        assert_eq!(kept, vec![corner(6, 5, 20.0), corner(9, 9, 1.0)]);
    }

    #[test]
    fn test_nms_equal_responses_keep_first() {
        let corners = vec![corner(5, 5, 3.0), corner(6, 6, 3.0)];
        let kept = KeypointRefinement::suppress_non_maxima(&corners, 16, 16);
        assert_eq!(kept, vec![corner(5, 5, 3.0)]);
    }

    #[test]
    fn test_nms_empty() {
        assert!(KeypointRefinement::suppress_non_maxima(&[], 16, 16).is_empty());
    }

    #[test]
    fn test_retain_best_orders_and_truncates() {
        let corners = vec![corner(1, 1, 1.0), corner(2, 2, 5.0), corner(3, 3, 3.0), corner(0, 4, 5.0)];
        let best = KeypointRefinement::retain_best(corners, 3);
        assert_eq!(best, vec![corner(2, 2, 5.0), corner(0, 4, 5.0), corner(3, 3, 3.0)]);
    }

    #[test]
    fn test_orientation_points_towards_bright_side() {
        // Bright right half: centroid lies along +x, angle near 0
        let img = Image::from_fn(41, 41, |x, _| if x > 20 { 200 } else { 10 });
        let angle = KeypointRefinement::compute_orientation(&img, 20, 20, 15);
        assert!(angle.abs() < 0.1, "angle {}", angle);

        // Bright bottom half: angle near +pi/2
        let img = Image::from_fn(41, 41, |_, y| if y > 20 { 200 } else { 10 });
        let angle = KeypointRefinement::compute_orientation(&img, 20, 20, 15);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 0.1, "angle {}", angle);
    }

    #[test]
    fn test_orientation_of_flat_patch_is_zero() {
        let img = Image::filled(41, 41, 0);
        assert_eq!(KeypointRefinement::compute_orientation(&img, 20, 20, 15), 0.0);
    }
}
