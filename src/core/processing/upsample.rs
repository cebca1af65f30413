//! Mask refinement from inference resolution to image resolution: bilinear resize
//! followed by a separable 5-tap box blur, all on flat `row * width + col` buffers.
//!
//! The two intermediate planes come from a [`BlurBufferPool`], so repeated calls at the
//! same target size do not allocate beyond the returned mask.
use image::GrayImage;
use tracing::debug;

use super::ops::clamp;
use crate::core::pool::BlurBufferPool;

/// Box blur window (pixels).
pub const BLUR_WINDOW: usize = 5;
const BLUR_RADIUS: isize = (BLUR_WINDOW / 2) as isize;

#[derive(Default)]
pub struct MaskUpsampler {
    pool: BlurBufferPool,
}

impl MaskUpsampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &BlurBufferPool {
        &self.pool
    }

    /// Resize `src` to `width × height` and soften the result.
    pub fn upsample(&self, src: &GrayImage, width: u32, height: u32) -> GrayImage {
        let (dw, dh) = (width as usize, height as usize);
        if dw == 0 || dh == 0 || src.width() == 0 || src.height() == 0 {
            return GrayImage::new(width, height);
        }
        debug!(
            "Upsampling mask {}x{} -> {}x{}",
            src.width(),
            src.height(),
            width,
            height
        );

        let mut bufs = self.pool.take();
        bufs.prepare(dw * dh);
        let bufs = &mut *bufs;

        resize_bilinear(
            src.as_raw(),
            src.width() as usize,
            src.height() as usize,
            &mut bufs.tmp,
            dw,
            dh,
        );
        box_blur_horizontal(&bufs.tmp, &mut bufs.h_pass, dw, dh);

        let mut out = vec![0u8; dw * dh];
        box_blur_vertical(&bufs.h_pass, &mut out, dw, dh);

        GrayImage::from_vec(width, height, out).unwrap_or_else(|| GrayImage::new(width, height))
    }
}

/// Bilinear resize with pixel-centre alignment; samples are clamped at the borders.
pub fn resize_bilinear(src: &[u8], sw: usize, sh: usize, dst: &mut [u8], dw: usize, dh: usize) {
    debug_assert_eq!(src.len(), sw * sh);
    debug_assert_eq!(dst.len(), dw * dh);

    let x_ratio = sw as f32 / dw as f32;
    let y_ratio = sh as f32 / dh as f32;
    let max_x = (sw - 1) as f32;
    let max_y = (sh - 1) as f32;

    for y in 0..dh {
        let fy = clamp((y as f32 + 0.5) * y_ratio - 0.5, 0.0, max_y);
        let y0 = fy as usize;
        let y1 = (y0 + 1).min(sh - 1);
        let wy = fy - y0 as f32;
        let row0 = &src[y0 * sw..(y0 + 1) * sw];
        let row1 = &src[y1 * sw..(y1 + 1) * sw];
        let out_row = &mut dst[y * dw..(y + 1) * dw];

        for (x, out) in out_row.iter_mut().enumerate() {
            let fx = clamp((x as f32 + 0.5) * x_ratio - 0.5, 0.0, max_x);
            let x0 = fx as usize;
            let x1 = (x0 + 1).min(sw - 1);
            let wx = fx - x0 as f32;

            let top = row0[x0] as f32 * (1.0 - wx) + row0[x1] as f32 * wx;
            let bottom = row1[x0] as f32 * (1.0 - wx) + row1[x1] as f32 * wx;
            *out = (top * (1.0 - wy) + bottom * wy).round() as u8;
        }
    }
}

/// Running-sum box blur along rows.
pub fn box_blur_horizontal(src: &[u8], dst: &mut [u8], w: usize, h: usize) {
    for y in 0..h {
        let row = &src[y * w..(y + 1) * w];
        let out = &mut dst[y * w..(y + 1) * w];
        blur_line(w, |i| row[i], |i, v| out[i] = v);
    }
}

/// Running-sum box blur along columns.
pub fn box_blur_vertical(src: &[u8], dst: &mut [u8], w: usize, h: usize) {
    for x in 0..w {
        blur_line(h, |i| src[i * w + x], |i, v| dst[i * w + x] = v);
    }
}

/// Slide a `BLUR_WINDOW` sum over `len` samples, clamping reads past either end.
#[inline]
fn blur_line(len: usize, read: impl Fn(usize) -> u8, mut write: impl FnMut(usize, u8)) {
    if len == 0 {
        return;
    }
    let last = len as isize - 1;
    let at = |i: isize| read(clamp(i, 0, last) as usize) as u32;

    let mut sum: u32 = (-BLUR_RADIUS..=BLUR_RADIUS).map(at).sum();
    for i in 0..len as isize {
        write(i as usize, ((sum + BLUR_WINDOW as u32 / 2) / BLUR_WINDOW as u32) as u8);
        sum = sum + at(i + BLUR_RADIUS + 1) - at(i - BLUR_RADIUS);
    }
}
