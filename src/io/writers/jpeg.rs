use jpeg_encoder::{ColorType, Encoder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{Error, Result};

pub const JPEG_QUALITY: u8 = 95;

fn dims(cols: u32, rows: u32) -> Result<(u16, u16)> {
    match (u16::try_from(cols), u16::try_from(rows)) {
        (Ok(c), Ok(r)) => Ok((c, r)),
        _ => Err(Error::InvalidArgument {
            arg: "jpeg size",
            value: format!("{}x{}", cols, rows),
        }),
    }
}

pub fn write_gray_jpeg(output: &Path, cols: u32, rows: u32, data: &[u8]) -> Result<()> {
    let (c, r) = dims(cols, rows)?;
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let encoder = Encoder::new(&mut writer, JPEG_QUALITY);
    encoder
        .encode(data, c, r, ColorType::Luma)
        .map_err(Error::external)?;
    Ok(())
}

pub fn write_rgb_jpeg(output: &Path, cols: u32, rows: u32, rgb_data: &[u8]) -> Result<()> {
    let (c, r) = dims(cols, rows)?;
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let encoder = Encoder::new(&mut writer, JPEG_QUALITY);
    encoder
        .encode(rgb_data, c, r, ColorType::Rgb)
        .map_err(Error::external)?;
    Ok(())
}
