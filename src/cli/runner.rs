use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use bgcrop::{
    MaskSource, ProcessingParams, Remover, process_directory_to_path, process_file_to_path,
};

use super::args::CliArgs;
use super::errors::AppError;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Start from the preset (or defaults) and apply every flag the user passed.
fn effective_params(args: &CliArgs) -> Result<ProcessingParams, AppError> {
    let mut params = match &args.config {
        Some(path) => {
            info!("Loading preset {:?}", path);
            ProcessingParams::from_json_file(path)?
        }
        None => ProcessingParams::default(),
    };

    if let Some(mode) = args.mode {
        params.mode = mode;
    }
    if let Some(source) = args.mask_source {
        params.mask_source = source;
    } else if args.config.is_none() && args.model.is_none() {
        params.mask_source = MaskSource::Auto;
    }
    if let Some(format) = args.format {
        params.format = format;
    }
    if let Some(margin) = args.margin {
        params.crop.margin = margin;
    }
    if let Some(percent) = args.margin_percent {
        params.crop.margin_percent = percent;
    }
    if let Some(threshold) = args.min_threshold {
        params.crop.min_threshold = threshold;
    }
    if args.square {
        params.crop.square_crop = true;
    }
    if let Some(background) = args.background {
        params.background = background;
    }
    if let Some(size) = args.input_size {
        params.input_size = size;
    }

    params.validate()?;
    Ok(params)
}

#[cfg(feature = "onnx")]
fn load_remover(model: &Path, params: &ProcessingParams) -> Result<Remover, AppError> {
    let remover = Remover::from_model_path(model, params.input_size)?
        .with_normalization(params.normalization)
        .with_background(params.background);
    Ok(remover)
}

#[cfg(not(feature = "onnx"))]
fn load_remover(model: &Path, _params: &ProcessingParams) -> Result<Remover, AppError> {
    Err(bgcrop::Error::InvalidArgument {
        arg: "model",
        value: format!("{} (built without the onnx feature)", model.display()),
    }
    .into())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        init_logging();
    }

    let params = effective_params(&args)?;
    if let Some(path) = &args.save_config {
        params.to_json_file(path)?;
        info!("Saved preset to {:?}", path);
    }

    let remover = match (&args.model, params.mask_source) {
        (Some(model), MaskSource::Model) => Some(load_remover(model, &params)?),
        (None, MaskSource::Model) => {
            return Err(AppError::MissingArgument {
                arg: "--model".to_string(),
            }
            .into());
        }
        (Some(_), _) => {
            info!(
                "Mask source is {}; the model will not be loaded",
                params.mask_source
            );
            None
        }
        (None, _) => None,
    };

    if args.input.is_some() && args.input_dir.is_some() {
        return Err(AppError::ConflictingArguments {
            first: "--input".to_string(),
            second: "--input-dir".to_string(),
        }
        .into());
    }

    if let Some(input_dir) = args.input_dir {
        let output_dir = args.output_dir.ok_or(AppError::MissingArgument {
            arg: "--output-dir".to_string(),
        })?;

        info!("Starting batch processing from directory: {:?}", input_dir);
        info!("Output directory: {:?}", output_dir);

        let report = process_directory_to_path(
            &input_dir,
            &output_dir,
            &params,
            remover.as_ref(),
            args.continue_on_error,
        )?;

        info!("Batch processing complete!");
        info!("Processed: {}", report.processed);
        info!("Skipped: {}", report.skipped);
        info!("Errors: {}", report.errors);
        if report.errors > 0 {
            return Err(AppError::BatchFailures {
                errors: report.errors,
            }
            .into());
        }
    } else {
        let input = args.input.ok_or(AppError::MissingArgument {
            arg: "--input".to_string(),
        })?;
        let output = args.output.ok_or(AppError::MissingArgument {
            arg: "--output".to_string(),
        })?;

        process_file_to_path(&input, &output, &params, remover.as_ref())?;
        info!("Successfully processed: {:?} -> {:?}", input, output);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bgcrop::ProcessingMode;
    use clap::Parser;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("bgcrop").chain(argv.iter().copied()))
            .expect("valid arguments")
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "-i", "in.png", "-o", "out.png", "--mode", "crop", "--margin", "5", "--square",
            "--background", "#000000",
        ]);
        let params = effective_params(&args).expect("params");
        assert_eq!(params.mode, ProcessingMode::Crop);
        assert_eq!(params.crop.margin, 5);
        assert!(params.crop.square_crop);
        assert_eq!(params.background, bgcrop::Rgb([0, 0, 0]));
    }

    #[test]
    fn no_model_defaults_to_auto_mask() {
        let params = effective_params(&parse(&["-i", "a.png", "-o", "b.png"])).expect("params");
        assert_eq!(params.mask_source, MaskSource::Auto);

        let params = effective_params(&parse(&["-i", "a.png", "-o", "b.png", "-m", "u2net.onnx"]))
            .expect("params");
        assert_eq!(params.mask_source, MaskSource::Model);
    }

    #[test]
    fn invalid_margin_percent_is_rejected() {
        let args = parse(&["-i", "a.png", "-o", "b.png", "--margin-percent=-1"]);
        assert!(effective_params(&args).is_err());
    }

    #[test]
    fn model_source_requires_model() {
        let args = parse(&["-i", "a.png", "-o", "b.png", "--mask-source", "model"]);
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("--model"));
    }
}
