//! Otsu binarization of a logit field.
//!
//! The histogram is built through a 256-entry sigmoid table over logits in `[-6, 6]`
//! instead of calling `exp` for every pixel. The table is immutable once built; a
//! process-wide instance is available through [`SigmoidLut::shared`].
use once_cell::sync::Lazy;
use tracing::debug;

use super::ops::{clamp, sigmoid};

pub const LUT_SIZE: usize = 256;
pub const LOGIT_MIN: f32 = -6.0;
pub const LOGIT_MAX: f32 = 6.0;

static SHARED_LUT: Lazy<SigmoidLut> = Lazy::new(SigmoidLut::new);

/// Sigmoid sampled at 256 equally spaced logits in `[LOGIT_MIN, LOGIT_MAX]`.
#[derive(Debug, Clone)]
pub struct SigmoidLut {
    table: [f32; LUT_SIZE],
}

impl SigmoidLut {
    pub fn new() -> Self {
        let mut table = [0.0f32; LUT_SIZE];
        let step = (LOGIT_MAX - LOGIT_MIN) / (LUT_SIZE - 1) as f32;
        for (i, v) in table.iter_mut().enumerate() {
            *v = sigmoid(LOGIT_MIN + step * i as f32);
        }
        Self { table }
    }

    /// The table built on first use and shared for the rest of the process.
    pub fn shared() -> &'static SigmoidLut {
        &SHARED_LUT
    }

    /// Table index of a logit; values outside `[-6, 6]` land on the end entries.
    #[inline]
    pub fn index(&self, logit: f32) -> usize {
        let pos = (logit - LOGIT_MIN) / (LOGIT_MAX - LOGIT_MIN) * (LUT_SIZE - 1) as f32;
        if pos.is_nan() {
            return 0;
        }
        clamp(pos.round(), 0.0, (LUT_SIZE - 1) as f32) as usize
    }

    #[inline]
    pub fn lookup(&self, logit: f32) -> f32 {
        self.table[self.index(logit)]
    }

    /// 8-bit probability bin of a logit, `floor(sigmoid * 255)`.
    #[inline]
    pub fn bin(&self, logit: f32) -> usize {
        clamp((self.lookup(logit) * 255.0) as i32, 0, 255) as usize
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.table
    }
}

impl Default for SigmoidLut {
    fn default() -> Self {
        Self::new()
    }
}

/// 256-bin histogram of `sigmoid(logit)` scaled to 8 bits.
pub fn probability_histogram(lut: &SigmoidLut, logits: &[f32]) -> [u64; 256] {
    let mut hist = [0u64; 256];
    for &v in logits {
        hist[lut.bin(v)] += 1;
    }
    hist
}

/// Split point in `[0, 1]` maximizing between-class variance of the sigmoid histogram.
///
/// Splits with an empty class are skipped; among equal maxima the lowest split wins.
/// Returns 0 when every value falls in one bin.
pub fn otsu_threshold(lut: &SigmoidLut, logits: &[f32]) -> f32 {
    let hist = probability_histogram(lut, logits);
    let t = otsu_split(&hist);
    debug!("otsu split {} over {} values", t, logits.len());
    t as f32 / 255.0
}

/// Histogram bin index maximizing `wB * wF * (mB - mF)^2`.
pub fn otsu_split(hist: &[u64; 256]) -> usize {
    let total: u64 = hist.iter().sum();
    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut w_b: u64 = 0;
    let mut sum_b = 0.0f64;
    let mut best_var = 0.0f64;
    let mut best_t = 0usize;

    for t in 0..255 {
        w_b += hist[t];
        sum_b += t as f64 * hist[t] as f64;
        if w_b == 0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0 {
            break;
        }

        let m_b = sum_b / w_b as f64;
        let m_f = (sum_all - sum_b) / w_f as f64;
        let between = w_b as f64 * w_f as f64 * (m_b - m_f) * (m_b - m_f);
        if between > best_var {
            best_var = between;
            best_t = t;
        }
    }

    best_t
}
