use crate::error::{VerifyError, VerifyResult};
use crate::extractor::from_gray_image;
use image::{ImageReader, RgbImage};
use note_core::Image;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Recognized image file extensions (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Reference image decoded to grayscale, with the label it is catalogued under
#[derive(Debug, Clone)]
pub struct LabeledImage {
    pub label: String,
    pub path: PathBuf,
    pub image: Image,
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Label for a file: its stem with surrounding whitespace removed
pub fn label_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .unwrap_or_default()
}

/// Image files directly inside `dir`, sorted by path
pub fn list_images<P: AsRef<Path>>(dir: P) -> VerifyResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Decode a file of any supported format to 8-bit grayscale
pub fn load_gray<P: AsRef<Path>>(path: P) -> VerifyResult<Image> {
    let gray = ImageReader::open(path)?.with_guessed_format()?.decode()?.to_luma8();
    from_gray_image(gray)
}

/// Decode a file to RGB for rendering
pub fn load_color<P: AsRef<Path>>(path: P) -> VerifyResult<RgbImage> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?.to_rgb8())
}

/// Load every readable reference image in `dir`.
///
/// Files that fail to decode are logged and skipped. An empty result is
/// reported as [`VerifyError::EmptyCatalog`].
pub fn load_reference_images<P: AsRef<Path>>(dir: P) -> VerifyResult<Vec<LabeledImage>> {
    let dir = dir.as_ref();
    let mut images = Vec::new();
    for path in list_images(dir)? {
        match load_gray(&path) {
            Ok(image) => {
                debug!(path = %path.display(), width = image.width(), height = image.height(), "loaded reference");
                images.push(LabeledImage {
                    label: label_of(&path),
                    path,
                    image,
                });
            }
            Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable reference"),
        }
    }
    if images.is_empty() {
        return Err(VerifyError::EmptyCatalog(dir.to_path_buf()));
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("note-verify-loader-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_extension_filter() {
        assert!(is_image_file(Path::new("a/500.jpg")));
        assert!(is_image_file(Path::new("a/500.JPEG")));
        assert!(is_image_file(Path::new("500.Png")));
        assert!(!is_image_file(Path::new("500.gif")));
        assert!(!is_image_file(Path::new("notes")));
    }

    #[test]
    fn test_label_is_trimmed_stem() {
        assert_eq!(label_of(Path::new("dir/ 500_front .jpg")), "500_front");
        assert_eq!(label_of(Path::new("100.png")), "100");
    }

    #[test]
    fn test_listing_is_sorted_and_filtered() {
        let dir = scratch_dir("list");
        for name in ["b.png", "a.jpg", "c.txt"] {
            std::fs::write(dir.join(name), b"x").unwrap();
        }
        let names: Vec<String> = list_images(&dir)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn test_unreadable_references_are_skipped() {
        let dir = scratch_dir("refs");
        std::fs::write(dir.join("100.jpg"), b"not an image").unwrap();
        GrayImage::from_pixel(8, 4, image::Luma([7])).save(dir.join("500.png")).unwrap();

        let refs = load_reference_images(&dir).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].label, "500");
        assert_eq!(refs[0].image.dimensions(), (8, 4));
        assert_eq!(refs[0].image.get(3, 2), 7);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = scratch_dir("empty");
        assert!(matches!(load_reference_images(&dir), Err(VerifyError::EmptyCatalog(_))));
    }
}
