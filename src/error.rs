//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Wraps I/O, codec and inference failures, and provides semantic variants for the
//! mask and crop stages (`NoObjectDetected`, `InvalidMask`).
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Preset error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No object detected in image")]
    NoObjectDetected,

    #[error("Invalid mask: {reason}")]
    InvalidMask { reason: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Dimension mismatch: image is {image_width}x{image_height}, mask is {mask_width}x{mask_height}")]
    DimensionMismatch {
        image_width: u32,
        image_height: u32,
        mask_width: u32,
        mask_height: u32,
    },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }

    pub fn inference<E: std::fmt::Display>(e: E) -> Self {
        Error::Inference(e.to_string())
    }

    pub fn invalid_mask(reason: impl Into<String>) -> Self {
        Error::InvalidMask {
            reason: reason.into(),
        }
    }
}
