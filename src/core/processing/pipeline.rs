use image::GrayImage;
use tracing::debug;

use crate::core::processing::otsu::{SigmoidLut, otsu_split, probability_histogram};
use crate::error::{Error, Result};

/// Turn a `side × side` logit field into a 0/255 mask.
///
/// A pixel is opaque when its 8-bit probability bin lies above the Otsu split, so the
/// comparison uses exactly the binning the histogram was built with.
pub fn binarize_logits(lut: &SigmoidLut, logits: &[f32], side: u32) -> Result<GrayImage> {
    let expected = side as usize * side as usize;
    if logits.len() != expected {
        return Err(Error::Inference(format!(
            "model returned {} values, expected {} ({}x{})",
            logits.len(),
            expected,
            side,
            side
        )));
    }

    let hist = probability_histogram(lut, logits);
    let split = otsu_split(&hist);
    debug!("Binarizing {}x{} logits at split bin {}", side, side, split);

    let data = logits
        .iter()
        .map(|&v| if lut.bin(v) > split { 255 } else { 0 })
        .collect();
    GrayImage::from_raw(side, side, data)
        .ok_or_else(|| Error::Processing("mask buffer has the wrong length".to_string()))
}
