use note_core::{ExtractorConfig, Image};

/// Extractor settings small enough for fast unit tests
pub(crate) fn small_extractor_config() -> ExtractorConfig {
    ExtractorConfig {
        max_features: 300,
        working_width: 240,
        working_height: 120,
        fast_threshold: 20,
        patch_size: 15,
        edge_threshold: 10,
        n_levels: 3,
        scale_factor: 1.2,
        n_threads: 1,
    }
}

fn mix(seed: u64, cx: usize, cy: usize) -> u64 {
    let mut z = seed
        ^ (cx as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (cy as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Dark field with pseudo-random bright blocks; `seed` selects the layout
pub(crate) fn banknote_like(width: usize, height: usize, seed: u64) -> Image {
    Image::from_fn(width, height, |x, y| {
        let h = mix(seed, x / 16, y / 16);
        let side = 5 + (h % 8) as usize;
        let ox = ((h >> 8) % 4) as usize;
        let oy = ((h >> 12) % 4) as usize;
        let (lx, ly) = (x % 16, y % 16);
        if lx >= ox && lx < ox + side && ly >= oy && ly < oy + side {
            90 + ((h >> 16) % 160) as u8
        } else {
            20
        }
    })
}
