use image::{DynamicImage, GenericImageView, RgbaImage};

/// Clamp `v` into `[lo, hi]`.
#[inline]
pub fn clamp<T: PartialOrd>(v: T, lo: T, hi: T) -> T {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

/// ITU-R BT.601 luma with integer weights.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000) as u8
}

/// Logistic function.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Widen an 8-bit channel to the 16-bit range (`v * 257`).
#[inline]
pub fn widen(v: u8) -> u32 {
    v as u32 * 257
}

/// Borrow the packed RGBA8 buffer of an image when it has one.
///
/// Rows are tightly packed, so the stride is `width * 4`.
#[inline]
pub fn packed_rgba(img: &DynamicImage) -> Option<&RgbaImage> {
    match img {
        DynamicImage::ImageRgba8(buf) => Some(buf),
        _ => None,
    }
}

/// RGBA of any pixel format, for the generic paths.
#[inline]
pub fn rgba_at(img: &DynamicImage, x: u32, y: u32) -> [u8; 4] {
    img.get_pixel(x, y).0
}
