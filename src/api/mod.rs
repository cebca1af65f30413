//! High-level, ergonomic library API: the model-driven [`Remover`], in-memory processing
//! by [`ProcessingParams`], and file/directory helpers. Prefer these entrypoints over the
//! low-level processing modules when integrating bgcrop.
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, RgbaImage};
use tracing::{info, warn};

use crate::core::params::ProcessingParams;
use crate::core::processing::composite::composite_over;
use crate::core::processing::crop::smart_crop_from_mask;
use crate::core::processing::mask::{
    AUTO_BACKGROUND_TOLERANCE, AUTO_EDGE_THRESHOLD, Mask, MaskStrategy,
};
use crate::core::processing::save::{save_mask, save_processed_image};
use crate::error::{Error, Result};
use crate::io::{is_supported_image, load_image};
use crate::types::{MaskSource, ProcessingMode};

mod remover;
pub use remover::Remover;

/// Result of in-memory processing
#[derive(Debug, Clone)]
pub enum ProcessedImage {
    /// Cut-out or crop
    Image(RgbaImage),
    /// Mask mode output, same size as the input
    Mask(GrayImage),
}

/// Model-free strategy for a mask source; `None` for [`MaskSource::Model`].
pub fn strategy_for(source: MaskSource) -> Option<MaskStrategy> {
    match source {
        MaskSource::Model => None,
        MaskSource::Auto => Some(MaskStrategy::Auto),
        MaskSource::Alpha => Some(MaskStrategy::Alpha),
        MaskSource::Background => Some(MaskStrategy::Background {
            color: None,
            tolerance: AUTO_BACKGROUND_TOLERANCE,
        }),
        MaskSource::Edges => Some(MaskStrategy::Edges {
            threshold: AUTO_EDGE_THRESHOLD,
        }),
    }
}

fn require_remover<'a>(remover: Option<&'a Remover>) -> Result<&'a Remover> {
    remover.ok_or_else(|| Error::InvalidArgument {
        arg: "model",
        value: "mask source 'model' needs a loaded model".to_string(),
    })
}

/// Run `params.mode` on an in-memory image.
///
/// `remover` is only consulted when `params.mask_source` is [`MaskSource::Model`].
pub fn process_image(
    image: &DynamicImage,
    params: &ProcessingParams,
    remover: Option<&Remover>,
) -> Result<ProcessedImage> {
    params.validate()?;
    let strategy = strategy_for(params.mask_source);

    match (params.mode, strategy) {
        (ProcessingMode::Cutout, None) => {
            let remover = require_remover(remover)?;
            Ok(ProcessedImage::Image(
                remover.remove_background_over(image, params.background)?,
            ))
        }
        (ProcessingMode::Cutout, Some(strategy)) => {
            let mask = strategy.mask(image);
            Ok(ProcessedImage::Image(composite_over(
                image,
                &mask,
                params.background,
            )?))
        }
        (ProcessingMode::Crop, None) => {
            let remover = require_remover(remover)?;
            Ok(ProcessedImage::Image(remover.smart_crop(image, &params.crop)?))
        }
        (ProcessingMode::Crop, Some(strategy)) => Ok(ProcessedImage::Image(
            smart_crop_from_mask(image, &strategy, &params.crop)?,
        )),
        (ProcessingMode::Mask, None) => {
            let remover = require_remover(remover)?;
            Ok(ProcessedImage::Mask(remover.refined_mask(image)?))
        }
        (ProcessingMode::Mask, Some(strategy)) => Ok(ProcessedImage::Mask(strategy.mask(image))),
    }
}

/// Process one image file to an output path using `params`.
pub fn process_file_to_path(
    input: &Path,
    output: &Path,
    params: &ProcessingParams,
    remover: Option<&Remover>,
) -> Result<()> {
    let image = load_image(input)?;
    info!(
        "Processing {:?} ({} via {}) -> {:?}",
        input, params.mode, params.mask_source, output
    );
    match process_image(&image, params, remover)? {
        ProcessedImage::Image(img) => save_processed_image(&img, output, params.format),
        ProcessedImage::Mask(mask) => save_mask(&mask, output, params.format),
    }
}

/// Batch processing report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Regular files directly inside `input_dir`, sorted by path.
pub fn iterate_images(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output path for `input` inside `output_dir`, with the extension of `params.format`.
pub fn output_path_for(input: &Path, output_dir: &Path, params: &ProcessingParams) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output_dir.join(format!("{}.{}", stem, params.format.extension()))
}

/// Process every image file in `input_dir` into `output_dir` using `params`.
/// Files without an image extension are counted as skipped.
/// If `continue_on_error` is true, errors are logged in the report and processing continues; otherwise, the first error is returned.
pub fn process_directory_to_path(
    input_dir: &Path,
    output_dir: &Path,
    params: &ProcessingParams,
    remover: Option<&Remover>,
    continue_on_error: bool,
) -> Result<BatchReport> {
    std::fs::create_dir_all(output_dir)?;
    params.validate()?;

    let mut report = BatchReport::default();
    for path in iterate_images(input_dir)? {
        if !is_supported_image(&path) {
            info!("Skipping non-image: {:?}", path);
            report.skipped += 1;
            continue;
        }

        let output_path = output_path_for(&path, output_dir, params);
        match process_file_to_path(&path, &output_path, params, remover) {
            Ok(()) => report.processed += 1,
            Err(e) => {
                warn!("Error processing {:?}: {}", path, e);
                report.errors += 1;
                if !continue_on_error {
                    return Err(e);
                }
            }
        }
    }

    info!(
        "Batch complete: processed={} skipped={} errors={}",
        report.processed, report.skipped, report.errors
    );
    Ok(report)
}
