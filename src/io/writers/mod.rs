//! Output encoders: PNG through `image`, JPEG through `jpeg-encoder`, TIFF through `tiff`.
pub mod jpeg;
pub mod png;
pub mod tiff;
