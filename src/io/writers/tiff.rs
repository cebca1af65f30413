use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tiff::encoder::{TiffEncoder, colortype};

use crate::error::{Error, Result};

pub fn write_tiff_gray8(output: &Path, cols: u32, rows: u32, data: &[u8]) -> Result<()> {
    let file = File::create(output)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(Error::external)?;
    encoder
        .write_image::<colortype::Gray8>(cols, rows, data)
        .map_err(Error::external)?;
    Ok(())
}

pub fn write_tiff_rgba8(output: &Path, cols: u32, rows: u32, data: &[u8]) -> Result<()> {
    let file = File::create(output)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file)).map_err(Error::external)?;
    encoder
        .write_image::<colortype::RGBA8>(cols, rows, data)
        .map_err(Error::external)?;
    Ok(())
}
