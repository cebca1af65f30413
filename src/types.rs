//! Shared types and enums used across bgcrop.
//! Includes `ProcessingMode`, `MaskSource`, `OutputFormat` and the `Rgb` background color.
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// What a processing run produces.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum ProcessingMode {
    /// Subject composited over a solid background, original size
    Cutout,
    /// Subject cropped out of the original with margins
    Crop,
    /// The grayscale mask only
    Mask,
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingMode::Cutout => write!(f, "Cutout"),
            ProcessingMode::Crop => write!(f, "Crop"),
            ProcessingMode::Mask => write!(f, "Mask"),
        }
    }
}

/// Where the object mask comes from.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum MaskSource {
    /// Segmentation model output, Otsu-binarized
    Model,
    /// Alpha, then uniform background, then edges
    Auto,
    Alpha,
    Background,
    Edges,
}

impl std::fmt::Display for MaskSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MaskSource::Model => "Model",
            MaskSource::Auto => "Auto",
            MaskSource::Alpha => "Alpha",
            MaskSource::Background => "Background",
            MaskSource::Edges => "Edges",
        };
        write!(f, "{}", s)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum OutputFormat {
    PNG,
    JPEG, // Lossy, no alpha
    TIFF,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::PNG => "png",
            OutputFormat::JPEG => "jpg",
            OutputFormat::TIFF => "tiff",
        }
    }
}

/// Solid 8-bit RGB color.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([255, 255, 255]);
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::WHITE
    }
}

impl std::str::FromStr for Rgb {
    type Err = String;

    /// Parses `#rrggbb`, `rrggbb` or `r,g,b`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.contains(',') {
            let parts: Vec<&str> = s.split(',').map(str::trim).collect();
            if parts.len() != 3 {
                return Err(format!("expected r,g,b, got '{}'", s));
            }
            let mut out = [0u8; 3];
            for (dst, part) in out.iter_mut().zip(parts) {
                *dst = part
                    .parse::<u8>()
                    .map_err(|_| format!("invalid channel '{}'", part))?;
            }
            return Ok(Rgb(out));
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("expected #rrggbb, got '{}'", s));
        }
        let mut out = [0u8; 3];
        for (i, dst) in out.iter_mut().enumerate() {
            *dst = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| format!("invalid hex color '{}'", s))?;
        }
        Ok(Rgb(out))
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}
