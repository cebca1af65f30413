use image::{DynamicImage, GenericImageView, GrayImage, RgbaImage};
use rayon::prelude::*;
use tracing::debug;

use super::ops::{packed_rgba, rgba_at};
use crate::error::{Error, Result};
use crate::types::Rgb;

/// `alpha * src + (1 - alpha) * bg` with `alpha = m / 255`, rounded.
#[inline]
pub fn blend_channel(src: u8, bg: u8, m: u8) -> u8 {
    let m = m as u32;
    ((m * src as u32 + (255 - m) * bg as u32 + 127) / 255) as u8
}

/// Composite `src` over solid white using `mask` as alpha.
pub fn composite_parallel(src: &DynamicImage, mask: &GrayImage) -> Result<RgbaImage> {
    composite_over(src, mask, Rgb::WHITE)
}

/// Composite `src` over a solid `background` using `mask` as alpha. Output is opaque.
///
/// Rows are split into one contiguous chunk per rayon worker; each chunk reads only its
/// own source and mask rows and writes only its own output rows. Returns once every
/// chunk is done.
pub fn composite_over(src: &DynamicImage, mask: &GrayImage, background: Rgb) -> Result<RgbaImage> {
    let (w, h) = src.dimensions();
    if mask.dimensions() != (w, h) {
        return Err(Error::DimensionMismatch {
            image_width: w,
            image_height: h,
            mask_width: mask.width(),
            mask_height: mask.height(),
        });
    }

    let (width, height) = (w as usize, h as usize);
    let row_bytes = width * 4;
    let mut out = vec![0u8; row_bytes * height];
    if out.is_empty() {
        return Ok(RgbaImage::new(w, h));
    }

    let workers = rayon::current_num_threads().max(1);
    let rows_per_chunk = height.div_ceil(workers);
    debug!(
        "Compositing {}x{} over {} in chunks of {} rows",
        w, h, background, rows_per_chunk
    );

    let mask_raw = mask.as_raw();
    let packed = packed_rgba(src);
    let bg = background.0;

    out.par_chunks_mut(rows_per_chunk * row_bytes)
        .enumerate()
        .for_each(|(chunk, rows)| {
            let first_row = chunk * rows_per_chunk;
            for (dy, out_row) in rows.chunks_exact_mut(row_bytes).enumerate() {
                let y = first_row + dy;
                let mask_row = &mask_raw[y * width..(y + 1) * width];
                match packed {
                    Some(buf) => {
                        let src_row = &buf.as_raw()[y * row_bytes..(y + 1) * row_bytes];
                        for ((dst, px), &m) in out_row
                            .chunks_exact_mut(4)
                            .zip(src_row.chunks_exact(4))
                            .zip(mask_row)
                        {
                            write_pixel(dst, [px[0], px[1], px[2]], bg, m);
                        }
                    }
                    None => {
                        let pixels = out_row.chunks_exact_mut(4).zip(mask_row);
                        for (x, (dst, &m)) in pixels.enumerate() {
                            let px = rgba_at(src, x as u32, y as u32);
                            write_pixel(dst, [px[0], px[1], px[2]], bg, m);
                        }
                    }
                }
            }
        });

    RgbaImage::from_vec(w, h, out)
        .ok_or_else(|| Error::Processing("composited buffer has the wrong length".to_string()))
}

#[inline]
fn write_pixel(dst: &mut [u8], src: [u8; 3], bg: [u8; 3], m: u8) {
    dst[0] = blend_channel(src[0], bg[0], m);
    dst[1] = blend_channel(src[1], bg[1], m);
    dst[2] = blend_channel(src[2], bg[2], m);
    dst[3] = 255;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb as RgbPixel, RgbImage, Rgba};

    fn red_source(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])))
    }

    fn half_mask(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, _| if x < w / 2 { Luma([0]) } else { Luma([255]) })
    }

    #[test]
    fn opaque_keeps_source_transparent_shows_white() {
        let out = composite_parallel(&red_source(10, 10), &half_mask(10, 10)).unwrap();
        assert_eq!(out.get_pixel(7, 5).0, [255, 0, 0, 255]);
        assert_eq!(out.get_pixel(2, 5).0, [255, 255, 255, 255]);
    }

    #[test]
    fn half_alpha_blends() {
        assert_eq!(blend_channel(0, 255, 128), 127);
        assert_eq!(blend_channel(200, 0, 255), 200);
        assert_eq!(blend_channel(200, 10, 0), 10);
    }

    #[test]
    fn custom_background() {
        let bg = Rgb([0, 0, 255]);
        let out = composite_over(&red_source(4, 4), &GrayImage::new(4, 4), bg).unwrap();
        assert!(out.pixels().all(|p| p.0 == [0, 0, 255, 255]));
    }

    #[test]
    fn generic_source_matches_packed() {
        let rgb = RgbImage::from_fn(37, 23, |x, y| RgbPixel([(x * 7) as u8, (y * 11) as u8, 90]));
        let mask = GrayImage::from_fn(37, 23, |x, y| Luma([((x * 13 + y * 5) % 256) as u8]));
        let generic = DynamicImage::ImageRgb8(rgb);
        let packed = DynamicImage::ImageRgba8(generic.to_rgba8());
        assert_eq!(
            composite_parallel(&generic, &mask).unwrap(),
            composite_parallel(&packed, &mask).unwrap()
        );
    }

    #[test]
    fn every_row_matches_sequential_reference() {
        let (w, h) = (31u32, 257u32);
        let src = RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x * 3) as u8, y as u8, (x ^ y) as u8, 255])
        });
        let mask = GrayImage::from_fn(w, h, |x, y| Luma([((x + y * 3) % 256) as u8]));
        let out = composite_parallel(&DynamicImage::ImageRgba8(src.clone()), &mask).unwrap();

        for y in 0..h {
            for x in 0..w {
                let s = src.get_pixel(x, y).0;
                let m = mask.get_pixel(x, y).0[0];
                let expected = [
                    blend_channel(s[0], 255, m),
                    blend_channel(s[1], 255, m),
                    blend_channel(s[2], 255, m),
                    255,
                ];
                assert_eq!(out.get_pixel(x, y).0, expected, "({x}, {y})");
            }
        }
    }

    #[test]
    fn mismatched_mask_is_rejected() {
        let err = composite_parallel(&red_source(10, 10), &GrayImage::new(5, 5)).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { mask_width: 5, .. }));
    }

    #[test]
    fn empty_image() {
        let out = composite_parallel(&red_source(0, 0), &GrayImage::new(0, 0)).unwrap();
        assert_eq!(out.dimensions(), (0, 0));
    }
}
