use std::path::Path;

use image::buffer::ConvertBuffer;
use image::{GrayImage, RgbImage, RgbaImage};
use tracing::info;

use crate::error::Result;
use crate::io::writers::jpeg::{write_gray_jpeg, write_rgb_jpeg};
use crate::io::writers::png::{write_gray_png, write_rgba_png};
use crate::io::writers::tiff::{write_tiff_gray8, write_tiff_rgba8};
use crate::types::OutputFormat;

/// Save a processed RGBA image. JPEG has no alpha, so the channel is dropped.
pub fn save_processed_image(image: &RgbaImage, output: &Path, format: OutputFormat) -> Result<()> {
    let (cols, rows) = image.dimensions();
    match format {
        OutputFormat::PNG => write_rgba_png(output, image)?,
        OutputFormat::JPEG => {
            let rgb: RgbImage = image.convert();
            write_rgb_jpeg(output, cols, rows, rgb.as_raw())?
        }
        OutputFormat::TIFF => write_tiff_rgba8(output, cols, rows, image.as_raw())?,
    }
    info!("Saved {}x{} image to {:?}", cols, rows, output);
    Ok(())
}

/// Save a single-channel mask.
pub fn save_mask(mask: &GrayImage, output: &Path, format: OutputFormat) -> Result<()> {
    let (cols, rows) = mask.dimensions();
    match format {
        OutputFormat::PNG => write_gray_png(output, mask)?,
        OutputFormat::JPEG => write_gray_jpeg(output, cols, rows, mask.as_raw())?,
        OutputFormat::TIFF => write_tiff_gray8(output, cols, rows, mask.as_raw())?,
    }
    info!("Saved {}x{} mask to {:?}", cols, rows, output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::load_image;
    use image::{Luma, Rgba};
    use tempfile::tempdir;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(12, 8, |x, y| Rgba([(x * 20) as u8, (y * 30) as u8, 77, 255]))
    }

    #[test]
    fn png_and_tiff_are_lossless() {
        let dir = tempdir().expect("tempdir");
        for format in [OutputFormat::PNG, OutputFormat::TIFF] {
            let path = dir.path().join(format!("out.{}", format.extension()));
            save_processed_image(&sample(), &path, format).expect("save");
            let back = load_image(&path).expect("load").to_rgba8();
            assert_eq!(back, sample(), "{:?}", format);
        }
    }

    #[test]
    fn jpeg_drops_alpha_and_decodes() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("out.jpg");
        save_processed_image(&sample(), &path, OutputFormat::JPEG).expect("save");
        let back = load_image(&path).expect("load");
        assert_eq!((back.width(), back.height()), (12, 8));
        assert!(!back.color().has_alpha());
    }

    #[test]
    fn masks_save_in_every_format() {
        let dir = tempdir().expect("tempdir");
        let mask = GrayImage::from_fn(9, 9, |x, _| Luma([if x > 4 { 255 } else { 0 }]));
        for format in [OutputFormat::PNG, OutputFormat::JPEG, OutputFormat::TIFF] {
            let path = dir.path().join(format!("mask.{}", format.extension()));
            save_mask(&mask, &path, format).expect("save");
            let back = load_image(&path).expect("load").to_luma8();
            assert_eq!(back.dimensions(), (9, 9));
            assert!(back.get_pixel(8, 4).0[0] > 128);
        }
    }
}
