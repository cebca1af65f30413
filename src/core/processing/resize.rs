use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::RgbImage;
use tracing::debug;

use crate::error::{Error, Result};

/// Resize an RGB image to exactly `target_cols × target_rows` with bilinear convolution.
///
/// Aspect ratio is not preserved; the model input is a fixed square.
pub fn resize_rgb_exact(src: &RgbImage, target_cols: u32, target_rows: u32) -> Result<RgbImage> {
    let (cols, rows) = src.dimensions();
    if cols == 0 || rows == 0 || target_cols == 0 || target_rows == 0 {
        return Err(Error::InvalidArgument {
            arg: "resize",
            value: format!("{}x{} -> {}x{}", cols, rows, target_cols, target_rows),
        });
    }
    if (cols, rows) == (target_cols, target_rows) {
        return Ok(src.clone());
    }
    debug!(
        "Resizing {}x{} -> {}x{}",
        cols, rows, target_cols, target_rows
    );

    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(cols, rows, src.as_raw().clone(), PixelType::U8x3)
        .map_err(Error::external)?;
    let mut dst_image = Image::new(target_cols, target_rows, PixelType::U8x3);
    resizer
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(Error::external)?;

    RgbImage::from_raw(target_cols, target_rows, dst_image.into_vec())
        .ok_or_else(|| Error::Processing("resized buffer has the wrong length".to_string()))
}
