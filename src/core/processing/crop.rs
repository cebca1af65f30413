use image::{DynamicImage, GenericImageView, GrayImage, RgbaImage};
use tracing::{debug, info};

use super::mask::Mask;
use crate::core::params::CropConfig;
use crate::error::{Error, Result};

/// Smallest axis-aligned rectangle holding every mask pixel at or above a threshold.
///
/// `width`/`height` are `max - min`, so a single pixel has zero extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub width: u32,
    pub height: u32,
    pub center_x: u32,
    pub center_y: u32,
}

impl ObjectBounds {
    /// Inverted corners give zero extent rather than wrapping.
    pub fn from_corners(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        let width = max_x.saturating_sub(min_x);
        let height = max_y.saturating_sub(min_y);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            width,
            height,
            center_x: min_x + width / 2,
            center_y: min_y + height / 2,
        }
    }
}

/// Crop rectangle in image space, `[x, x + width) × [y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Scan the mask once; `None` when no pixel reaches `min_threshold`.
pub fn detect_object_bounds(mask: &GrayImage, min_threshold: u8) -> Option<ObjectBounds> {
    let w = mask.width() as usize;
    if w == 0 {
        return None;
    }

    let mut found = false;
    let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
    let (mut max_x, mut max_y) = (0u32, 0u32);

    for (y, row) in mask.as_raw().chunks_exact(w).enumerate() {
        let y = y as u32;
        for (x, &v) in row.iter().enumerate() {
            if v >= min_threshold {
                let x = x as u32;
                found = true;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
    }

    found.then(|| ObjectBounds::from_corners(min_x, min_y, max_x, max_y))
}

/// Map mask-space bounds into an image-space crop with margins and optional squaring.
///
/// With `margin_percent > 0` the margin is the larger of the fixed margin and the larger
/// per-axis percentage margin, applied uniformly on every side. Squaring grows the
/// shorter side around its centre and is clipped at the image border, so a subject near
/// an edge can still come out non-square.
pub fn compute_crop_rect(
    bounds: &ObjectBounds,
    scale_x: f64,
    scale_y: f64,
    config: &CropConfig,
    image_width: u32,
    image_height: u32,
) -> CropRect {
    let (img_w, img_h) = (image_width as i64, image_height as i64);

    let min_x = (bounds.min_x as f64 * scale_x) as i64;
    let min_y = (bounds.min_y as f64 * scale_y) as i64;
    let max_x = (bounds.max_x as f64 * scale_x) as i64;
    let max_y = (bounds.max_y as f64 * scale_y) as i64;
    let (obj_w, obj_h) = (max_x - min_x, max_y - min_y);

    let mut margin = config.margin as i64;
    if config.margin_percent > 0.0 {
        let margin_x = (obj_w as f64 * config.margin_percent).round() as i64;
        let margin_y = (obj_h as f64 * config.margin_percent).round() as i64;
        margin = margin.max(margin_x.max(margin_y));
    }

    let mut x0 = (min_x - margin).max(0);
    let mut y0 = (min_y - margin).max(0);
    let mut x1 = (max_x + margin).min(img_w);
    let mut y1 = (max_y + margin).min(img_h);

    if config.square_crop {
        let (cw, ch) = (x1 - x0, y1 - y0);
        if cw > ch {
            let diff = cw - ch;
            y0 = (y0 - diff / 2).max(0);
            y1 = (y1 + (diff - diff / 2)).min(img_h);
        } else if ch > cw {
            let diff = ch - cw;
            x0 = (x0 - diff / 2).max(0);
            x1 = (x1 + (diff - diff / 2)).min(img_w);
        }
    }

    let x0 = x0.min(img_w);
    let y0 = y0.min(img_h);
    CropRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0).max(0) as u32,
        height: (y1 - y0).max(0) as u32,
    }
}

/// Crop `image` around the object in `mask`.
///
/// `scale_x`/`scale_y` map mask coordinates to image coordinates (1.0 when the mask was
/// computed at image resolution).
pub fn crop(
    image: &DynamicImage,
    mask: Option<&GrayImage>,
    config: &CropConfig,
    scale_x: f64,
    scale_y: f64,
) -> Result<RgbaImage> {
    let mask = mask.ok_or_else(|| Error::invalid_mask("no mask supplied"))?;
    if mask.width() == 0 || mask.height() == 0 {
        return Err(Error::invalid_mask("mask is empty"));
    }

    let bounds =
        detect_object_bounds(mask, config.min_threshold).ok_or(Error::NoObjectDetected)?;
    debug!("object bounds in mask space: {:?}", bounds);

    let (img_w, img_h) = image.dimensions();
    let rect = compute_crop_rect(&bounds, scale_x, scale_y, config, img_w, img_h);
    info!(
        "Crop {}x{} at ({}, {}) from {}x{}",
        rect.width, rect.height, rect.x, rect.y, img_w, img_h
    );

    Ok(image
        .crop_imm(rect.x, rect.y, rect.width, rect.height)
        .to_rgba8())
}

/// Build a mask with `source` and crop around it, scaling from mask to image size.
pub fn smart_crop_from_mask<M: Mask + ?Sized>(
    image: &DynamicImage,
    source: &M,
    config: &CropConfig,
) -> Result<RgbaImage> {
    let mask = source.mask(image);
    if mask.width() == 0 || mask.height() == 0 {
        return Err(Error::invalid_mask("mask source produced an empty mask"));
    }
    let scale_x = image.width() as f64 / mask.width() as f64;
    let scale_y = image.height() as f64 / mask.height() as f64;
    crop(image, Some(&mask), config, scale_x, scale_y)
}
