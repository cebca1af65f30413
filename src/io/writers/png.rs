use std::path::Path;

use image::{GrayImage, ImageFormat, RgbaImage};

use crate::error::Result;

pub fn write_rgba_png(output: &Path, image: &RgbaImage) -> Result<()> {
    image.save_with_format(output, ImageFormat::Png)?;
    Ok(())
}

pub fn write_gray_png(output: &Path, mask: &GrayImage) -> Result<()> {
    mask.save_with_format(output, ImageFormat::Png)?;
    Ok(())
}
