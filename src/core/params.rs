use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{MaskSource, OutputFormat, ProcessingMode, Rgb};

/// Square spatial size of the model input and output tensors.
pub const DEFAULT_INPUT_SIZE: u32 = 320;

/// Smart-crop behaviour around the detected object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Margin in pixels around the detected object
    pub margin: u32,
    /// Margin as a fraction of the object size; used when > 0
    pub margin_percent: f64,
    /// Minimum mask value counted as part of the object
    pub min_threshold: u8,
    /// Grow the shorter side so the crop comes out square
    pub square_crop: bool,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            margin: 20,
            margin_percent: 0.0,
            min_threshold: 10,
            square_crop: false,
        }
    }
}

/// Per-channel mean/std applied to `[0, 1]` RGB values before inference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Normalization {
    /// ImageNet statistics, which U²-Net style models are trained with.
    pub const IMAGENET: Normalization = Normalization {
        mean: [0.485, 0.456, 0.406],
        std: [0.229, 0.224, 0.225],
    };

    #[inline]
    pub fn apply(&self, channel: usize, value: u8) -> f32 {
        (value as f32 / 255.0 - self.mean[channel]) / self.std[channel]
    }
}

impl Default for Normalization {
    fn default() -> Self {
        Normalization::IMAGENET
    }
}

/// Processing parameters suitable for config files and presets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParams {
    pub mode: ProcessingMode,
    pub mask_source: MaskSource,
    pub format: OutputFormat,
    pub crop: CropConfig,
    /// Color behind the subject in cut-out mode
    pub background: Rgb,
    /// Model input side length in pixels
    pub input_size: u32,
    pub normalization: Normalization,
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Cutout,
            mask_source: MaskSource::Model,
            format: OutputFormat::PNG,
            crop: CropConfig::default(),
            background: Rgb::WHITE,
            input_size: DEFAULT_INPUT_SIZE,
            normalization: Normalization::IMAGENET,
        }
    }
}

impl ProcessingParams {
    /// Load a JSON preset. Leading `//` comment lines are ignored.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let json_start = content.find('{').ok_or_else(|| Error::InvalidArgument {
            arg: "config",
            value: path.display().to_string(),
        })?;
        let params: ProcessingParams = serde_json::from_str(&content[json_start..])?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let mut content = String::new();
        content.push_str("// bgcrop processing preset\n");
        content.push_str(&format!("// Version: {}\n\n", env!("CARGO_PKG_VERSION")));
        content.push_str(&serde_json::to_string_pretty(self)?);
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(Error::InvalidArgument {
                arg: "input_size",
                value: self.input_size.to_string(),
            });
        }
        if !self.crop.margin_percent.is_finite() || self.crop.margin_percent < 0.0 {
            return Err(Error::InvalidArgument {
                arg: "margin_percent",
                value: self.crop.margin_percent.to_string(),
            });
        }
        if self.normalization.std.iter().any(|&s| s == 0.0) {
            return Err(Error::InvalidArgument {
                arg: "normalization.std",
                value: format!("{:?}", self.normalization.std),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn crop_config_defaults() {
        let cfg = CropConfig::default();
        assert_eq!(cfg.margin, 20);
        assert_eq!(cfg.min_threshold, 10);
        assert_eq!(cfg.margin_percent, 0.0);
        assert!(!cfg.square_crop);
    }

    #[test]
    fn normalization_maps_mean_to_zero() {
        let norm = Normalization {
            mean: [0.5, 0.5, 0.5],
            std: [0.5, 0.5, 0.5],
        };
        assert!((norm.apply(0, 255) - 1.0).abs() < 1e-6);
        assert!((norm.apply(1, 0) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn preset_round_trips_through_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("preset.json");
        let params = ProcessingParams {
            mode: ProcessingMode::Crop,
            mask_source: MaskSource::Edges,
            crop: CropConfig {
                margin: 5,
                square_crop: true,
                ..CropConfig::default()
            },
            ..ProcessingParams::default()
        };
        params.to_json_file(&path).expect("write preset");

        let loaded = ProcessingParams::from_json_file(&path).expect("load preset");
        assert_eq!(loaded.mode, ProcessingMode::Crop);
        assert_eq!(loaded.mask_source, MaskSource::Edges);
        assert_eq!(loaded.crop, params.crop);
        assert_eq!(loaded.input_size, DEFAULT_INPUT_SIZE);
    }

    #[test]
    fn partial_preset_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "crop": { "margin_percent": 0.25 } }"#).unwrap();

        let loaded = ProcessingParams::from_json_file(&path).expect("load preset");
        assert_eq!(loaded.crop.margin_percent, 0.25);
        assert_eq!(loaded.crop.margin, 20);
        assert_eq!(loaded.mode, ProcessingMode::Cutout);
    }

    #[test]
    fn rejects_zero_input_size() {
        let params = ProcessingParams {
            input_size: 0,
            ..ProcessingParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(Error::InvalidArgument { arg: "input_size", .. })
        ));
    }
}
