//! Mask synthesis without a model: alpha extraction, distance from a background color,
//! and Sobel edges, plus the [`auto_mask`] dispatcher that picks between them.
//!
//! Every strategy has a fast path over packed RGBA8 buffers and a per-pixel fallback
//! for the other `DynamicImage` variants. Color comparisons happen in 16-bit channel
//! space (`v * 257`).
use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use super::ops::{luma, packed_rgba, rgba_at, widen};
use crate::types::Rgb;

/// Tolerance used when the dispatcher falls back to the background strategy.
pub const AUTO_BACKGROUND_TOLERANCE: f64 = 200.0;
/// Gradient threshold used when the dispatcher falls back to edges.
pub const AUTO_EDGE_THRESHOLD: f64 = 200.0;
/// Gaussian sigma of the pre-pass before edge detection.
pub const AUTO_EDGE_BLUR_SIGMA: f32 = 1.0;
/// Per-sample color variance (16-bit space) below which the border counts as uniform.
pub const UNIFORM_VARIANCE_LIMIT: f64 = 2e8;

const ALPHA_GRID: u32 = 5;
const OPAQUE: u8 = 255;

/// Anything that turns an image into a single-channel mask of the same size.
pub trait Mask {
    fn mask(&self, img: &DynamicImage) -> GrayImage;
}

impl<F> Mask for F
where
    F: Fn(&DynamicImage) -> GrayImage,
{
    fn mask(&self, img: &DynamicImage) -> GrayImage {
        self(img)
    }
}

/// Model-free mask strategies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaskStrategy {
    Auto,
    Alpha,
    /// `color: None` samples the image border for the reference color
    Background { color: Option<Rgb>, tolerance: f64 },
    Edges { threshold: f64 },
}

impl Mask for MaskStrategy {
    fn mask(&self, img: &DynamicImage) -> GrayImage {
        match *self {
            MaskStrategy::Auto => auto_mask(img),
            MaskStrategy::Alpha => mask_from_alpha(img),
            MaskStrategy::Background { color, tolerance } => {
                let color = color.unwrap_or_else(|| detect_uniform_background(img).0);
                mask_from_background(img, color, tolerance)
            }
            MaskStrategy::Edges { threshold } => mask_from_edges(img, threshold),
        }
    }
}

/// Pick the most reliable model-free signal:
/// 1. the alpha channel when it carries any transparency,
/// 2. distance from the border color when the border is uniform,
/// 3. Sobel edges of a lightly blurred copy.
pub fn auto_mask(img: &DynamicImage) -> GrayImage {
    if has_alpha(img) {
        debug!("auto mask: using alpha channel");
        return mask_from_alpha(img);
    }

    let (bg, uniform) = detect_uniform_background(img);
    if uniform {
        debug!("auto mask: uniform background {}", bg);
        return mask_from_background(img, bg, AUTO_BACKGROUND_TOLERANCE);
    }

    debug!("auto mask: falling back to edges");
    let blurred = img.blur(AUTO_EDGE_BLUR_SIGMA);
    mask_from_edges(&blurred, AUTO_EDGE_THRESHOLD)
}

/// Sample a 5×5 grid of cell centres and report whether any sample is not fully opaque.
pub fn has_alpha(img: &DynamicImage) -> bool {
    if !img.color().has_alpha() {
        return false;
    }
    let (w, h) = (img.width(), img.height());
    for gy in 0..ALPHA_GRID {
        let y = grid_point(gy, h);
        for gx in 0..ALPHA_GRID {
            let x = grid_point(gx, w);
            if x < w && y < h && rgba_at(img, x, y)[3] < OPAQUE {
                return true;
            }
        }
    }
    false
}

#[inline]
fn grid_point(i: u32, extent: u32) -> u32 {
    ((2 * i as u64 + 1) * extent as u64 / (2 * ALPHA_GRID as u64)) as u32
}

/// Estimate the background from the four corners plus the top and bottom midpoints.
///
/// Returns the centroid color and whether the samples are close enough to call the
/// background uniform.
pub fn detect_uniform_background(img: &DynamicImage) -> (Rgb, bool) {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return (Rgb::WHITE, false);
    }

    let points = [
        (0, 0),
        (w - 1, 0),
        (0, h - 1),
        (w - 1, h - 1),
        (w / 2, 0),
        (w / 2, h - 1),
    ];
    let n = points.len() as f64;

    let samples: Vec<[f64; 3]> = points
        .iter()
        .map(|&(x, y)| {
            let p = rgba_at(img, x, y);
            [widen(p[0]) as f64, widen(p[1]) as f64, widen(p[2]) as f64]
        })
        .collect();

    let mut mean = [0.0f64; 3];
    for s in &samples {
        for c in 0..3 {
            mean[c] += s[c];
        }
    }
    for m in mean.iter_mut() {
        *m /= n;
    }

    let variance = samples
        .iter()
        .map(|s| (0..3).map(|c| (s[c] - mean[c]).powi(2)).sum::<f64>())
        .sum::<f64>()
        / n;

    let color = Rgb([
        (mean[0] / 257.0).round() as u8,
        (mean[1] / 257.0).round() as u8,
        (mean[2] / 257.0).round() as u8,
    ]);
    (color, variance < UNIFORM_VARIANCE_LIMIT)
}

/// Use the alpha channel as the mask. Sources without alpha come out fully opaque.
pub fn mask_from_alpha(img: &DynamicImage) -> GrayImage {
    let (w, h) = (img.width(), img.height());

    if let Some(buf) = packed_rgba(img) {
        let alpha: Vec<u8> = buf.as_raw().chunks_exact(4).map(|px| px[3]).collect();
        return gray_from_vec(w, h, alpha);
    }

    if !img.color().has_alpha() {
        return GrayImage::from_pixel(w, h, Luma([OPAQUE]));
    }

    GrayImage::from_fn(w, h, |x, y| Luma([rgba_at(img, x, y)[3]]))
}

/// Opaque where a pixel is farther than `tolerance` (8-bit units) from `bg`.
pub fn mask_from_background(img: &DynamicImage, bg: Rgb, tolerance: f64) -> GrayImage {
    let (w, h) = (img.width(), img.height());
    let limit = (tolerance * 257.0).powi(2);
    let reference = [widen(bg.0[0]), widen(bg.0[1]), widen(bg.0[2])];

    let classify = |r: u8, g: u8, b: u8| -> u8 {
        let dist2: u64 = [r, g, b]
            .iter()
            .zip(reference.iter())
            .map(|(&v, &bgv)| {
                let d = widen(v).abs_diff(bgv) as u64;
                d * d
            })
            .sum();
        if dist2 as f64 > limit { OPAQUE } else { 0 }
    };

    if let Some(buf) = packed_rgba(img) {
        let data: Vec<u8> = buf
            .as_raw()
            .chunks_exact(4)
            .map(|px| classify(px[0], px[1], px[2]))
            .collect();
        return gray_from_vec(w, h, data);
    }

    GrayImage::from_fn(w, h, |x, y| {
        let p = rgba_at(img, x, y);
        Luma([classify(p[0], p[1], p[2])])
    })
}

/// Luma of every pixel.
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    let (w, h) = (img.width(), img.height());

    if let Some(buf) = packed_rgba(img) {
        let data: Vec<u8> = buf
            .as_raw()
            .chunks_exact(4)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect();
        return gray_from_vec(w, h, data);
    }

    GrayImage::from_fn(w, h, |x, y| {
        let p = rgba_at(img, x, y);
        Luma([luma(p[0], p[1], p[2])])
    })
}

/// Sobel edge mask: opaque where the gradient magnitude exceeds `threshold`.
///
/// The one-pixel border has no full neighbourhood and is always 0.
pub fn mask_from_edges(img: &DynamicImage, threshold: f64) -> GrayImage {
    let gray = to_grayscale(img);
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let src = gray.as_raw();
    let mut out = vec![0u8; w * h];
    let limit = threshold * threshold;

    if w >= 3 && h >= 3 {
        for y in 1..h - 1 {
            let above = &src[(y - 1) * w..y * w];
            let row = &src[y * w..(y + 1) * w];
            let below = &src[(y + 1) * w..(y + 2) * w];
            for x in 1..w - 1 {
                let p = |r: &[u8], dx: usize| r[x + dx - 1] as i32;
                let gx = (p(above, 2) + 2 * p(row, 2) + p(below, 2))
                    - (p(above, 0) + 2 * p(row, 0) + p(below, 0));
                let gy = (p(below, 0) + 2 * p(below, 1) + p(below, 2))
                    - (p(above, 0) + 2 * p(above, 1) + p(above, 2));
                let mag2 = (gx * gx + gy * gy) as f64;
                if mag2 > limit {
                    out[y * w + x] = OPAQUE;
                }
            }
        }
    }

    gray_from_vec(w as u32, h as u32, out)
}

fn gray_from_vec(w: u32, h: u32, data: Vec<u8>) -> GrayImage {
    // Length always equals w * h by construction.
    GrayImage::from_vec(w, h, data).unwrap_or_else(|| GrayImage::new(w, h))
}
