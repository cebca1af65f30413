//! I/O layer: image decoding with format sniffing, the supported input extensions used by
//! batch mode, and `writers` for PNG/JPEG/TIFF outputs.
use std::path::Path;

use image::{DynamicImage, ImageReader};
use tracing::debug;

use crate::error::Result;

pub mod writers;

/// Extensions batch mode treats as images (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "webp", "bmp"];

/// Decode an image, trusting the file contents over its extension.
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    debug!(
        "Loaded {:?}: {}x{} {:?}",
        path,
        img.width(),
        img.height(),
        img.color()
    );
    Ok(img)
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|known| e.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn recognises_image_extensions() {
        assert!(is_supported_image(Path::new("a/photo.JPG")));
        assert!(is_supported_image(Path::new("scan.tiff")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn loads_png_with_alpha() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("in.png");
        RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]))
            .save(&path)
            .expect("save");

        let img = load_image(&path).expect("load");
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.to_rgba8().get_pixel(0, 0).0, [1, 2, 3, 4]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_image(Path::new("/nonexistent/in.png")).unwrap_err();
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
