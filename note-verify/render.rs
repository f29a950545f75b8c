use crate::decision::Authenticity;
use crate::error::VerifyResult;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};

pub const PANEL_WIDTH: u32 = 400;
pub const PANEL_HEIGHT: u32 = 250;
pub const BANNER_HEIGHT: u32 = 30;

const SWATCH_SIZE: u32 = 20;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const GENUINE_COLOR: Rgb<u8> = Rgb([0, 200, 0]);
const NOT_GENUINE_COLOR: Rgb<u8> = Rgb([220, 0, 0]);

pub fn verdict_color(authenticity: Authenticity) -> Rgb<u8> {
    match authenticity {
        Authenticity::Genuine => GENUINE_COLOR,
        Authenticity::NotGenuine => NOT_GENUINE_COLOR,
    }
}

/// Resize to a panel and put a white banner with a verdict swatch above it
fn panel(image: Option<&RgbImage>, authenticity: Authenticity) -> RgbImage {
    let mut out = RgbImage::from_pixel(PANEL_WIDTH, PANEL_HEIGHT + BANNER_HEIGHT, WHITE);
    let body = match image {
        Some(img) => imageops::resize(img, PANEL_WIDTH, PANEL_HEIGHT, FilterType::Triangle),
        None => RgbImage::new(PANEL_WIDTH, PANEL_HEIGHT),
    };
    imageops::overlay(&mut out, &body, 0, BANNER_HEIGHT as i64);

    let inset = ((BANNER_HEIGHT - SWATCH_SIZE) / 2) as i32;
    draw_filled_rect_mut(
        &mut out,
        Rect::at(inset, inset).of_size(SWATCH_SIZE, SWATCH_SIZE),
        verdict_color(authenticity),
    );
    out
}

/// Reference (left) and candidate (right) side by side.
///
/// A missing reference is drawn as a black panel.
pub fn render_composite(reference: Option<&RgbImage>, candidate: &RgbImage, authenticity: Authenticity) -> RgbImage {
    let mut canvas = RgbImage::new(PANEL_WIDTH * 2, PANEL_HEIGHT + BANNER_HEIGHT);
    imageops::overlay(&mut canvas, &panel(reference, authenticity), 0, 0);
    imageops::overlay(&mut canvas, &panel(Some(candidate), authenticity), PANEL_WIDTH as i64, 0);
    canvas
}

/// `<dir>/<candidate stem>_check.png`
pub fn composite_path(dir: &Path, candidate_filename: &str) -> PathBuf {
    let stem = Path::new(candidate_filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| candidate_filename.to_string());
    dir.join(format!("{stem}_check.png"))
}

/// Render and write the composite, creating `dir` if needed
pub fn save_composite(
    dir: &Path,
    candidate_filename: &str,
    reference: Option<&RgbImage>,
    candidate: &RgbImage,
    authenticity: Authenticity,
) -> VerifyResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = composite_path(dir, candidate_filename);
    render_composite(reference, candidate, authenticity).save(&path)?;
    Ok(path)
}
