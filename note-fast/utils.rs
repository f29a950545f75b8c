//! Bit-level helpers for the FAST segment test

use crate::types::CornerType;

/// Pack the circle classification into a 16-bit mask of pixels equal to `wanted`
pub(crate) fn circle_mask(circle: &[CornerType; 16], wanted: CornerType) -> u16 {
    let mut mask: u16 = 0;
    for (i, &kind) in circle.iter().enumerate() {
        if kind == wanted {
            mask |= 1 << i;
        }
    }
    mask
}

/// Check if there are at least `min_count` consecutive set bits in the circular mask
/// using a branch-free rotate-and-AND reduction
pub fn has_contiguous_arc(mask: u16, min_count: usize) -> bool {
    if min_count > 16 || min_count == 0 {
        return false;
    }
    if (mask.count_ones() as usize) < min_count {
        return false;
    }

    // Bit k survives iff bits k, k-1, ..., k-(n-1) are all set (mod 16)
    let mut test_mask = mask;
    for i in 1..min_count as u32 {
        test_mask &= mask.rotate_left(i);
        if test_mask == 0 {
            return false;
        }
    }

    test_mask != 0
}

/// Straightforward scan over the doubled circle, used to cross-check the bitmask version
#[cfg(test)]
fn has_contiguous_arc_scan(mask: u16, min_count: usize) -> bool {
    if min_count > 16 || min_count == 0 {
        return false;
    }

    let mut run = 0;
    for i in 0..32 {
        if mask & (1 << (i % 16)) != 0 {
            run += 1;
            if run >= min_count {
                return true;
            }
        } else {
            run = 0;
        }
    }

    false
}
