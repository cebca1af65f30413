//! Model input preparation: square resize and per-channel normalization into a
//! `1 × 3 × S × S` planar tensor.
use image::DynamicImage;
use ndarray::{Array4, s};
use tracing::debug;

use super::resize::resize_rgb_exact;
use crate::core::params::Normalization;
use crate::error::{Error, Result};

/// Resize `image` to `side × side` and write normalized CHW values into `input`.
///
/// `input` must already have shape `(1, 3, side, side)`; pooled tensors are prepared
/// with [`TensorBuffers::prepare`](crate::core::pool::TensorBuffers::prepare).
pub fn preprocess_into(
    image: &DynamicImage,
    side: u32,
    normalization: &Normalization,
    input: &mut Array4<f32>,
) -> Result<()> {
    let s_len = side as usize;
    if input.dim() != (1, 3, s_len, s_len) {
        return Err(Error::Processing(format!(
            "input tensor has shape {:?}, expected (1, 3, {}, {})",
            input.dim(),
            side,
            side
        )));
    }

    let rgb = resize_rgb_exact(&image.to_rgb8(), side, side)?;
    let raw = rgb.as_raw();
    let stride: usize = 3;
    debug!("Preprocessed {}x{} into {}x{} tensor", image.width(), image.height(), side, side);

    for c in 0..stride {
        let mut plane = input.slice_mut(s![0, c, .., ..]);
        for ((y, x), v) in plane.indexed_iter_mut() {
            *v = normalization.apply(c, raw[(y * s_len + x) * stride + c]);
        }
    }
    Ok(())
}
