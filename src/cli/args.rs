use clap::Parser;
use std::path::PathBuf;

use bgcrop::{MaskSource, OutputFormat, ProcessingMode, Rgb};

#[derive(Parser)]
#[command(name = "bgcrop", version, about = "Background removal and smart crop")]
pub struct CliArgs {
    /// Input image (single file mode)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Input directory of images (batch mode)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Output filename (single file mode)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing (batch mode)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// ONNX segmentation model (required for --mask-source model)
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// JSON preset with processing parameters; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective parameters to a JSON preset and continue
    #[arg(long)]
    pub save_config: Option<PathBuf>,

    /// What to produce (cutout, crop or mask)
    #[arg(long, value_enum)]
    pub mode: Option<ProcessingMode>,

    /// Where the object mask comes from (model, auto, alpha, background, edges)
    #[arg(long, value_enum)]
    pub mask_source: Option<MaskSource>,

    /// Output format (png, jpeg or tiff)
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Crop margin in pixels
    #[arg(long)]
    pub margin: Option<u32>,

    /// Crop margin as a fraction of the object size (e.g. 0.1)
    #[arg(long)]
    pub margin_percent: Option<f64>,

    /// Minimum mask value counted as part of the object
    #[arg(long)]
    pub min_threshold: Option<u8>,

    /// Expand the crop to a square
    #[arg(long, default_value_t = false)]
    pub square: bool,

    /// Cut-out background color ("#rrggbb", "rrggbb" or "r,g,b")
    #[arg(long)]
    pub background: Option<Rgb>,

    /// Model input size in pixels
    #[arg(long)]
    pub input_size: Option<u32>,

    /// Enable logging (RUST_LOG overrides the level)
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Batch mode: continue processing other files after a failure
    #[arg(long, default_value_t = false)]
    pub continue_on_error: bool,
}
