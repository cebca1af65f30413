#![doc = r#"
bgcrop: background removal and smart cropping on top of a segmentation model.

The crate turns the per-pixel logits of a salient-object model (U²-Net style, square
input) into a binary mask with Otsu's method, then either composites the subject over a
solid background or crops the original image around it. Model-free masks (alpha
channel, uniform-background distance, Sobel edges) drive the same crop and cut-out
stages when no model is available.

Stability
---------
The public library API is experimental in initial releases and may evolve.

Add dependency
--------------
```toml
[dependencies]
bgcrop = "0.1"                                             # tract ONNX backend on
bgcrop = { version = "0.1", default-features = false }     # bring your own engine
```

Quick start: cut out a subject
------------------------------
```rust,no_run
use bgcrop::{Remover, Rgb, load_image};
use std::path::Path;

fn main() -> bgcrop::Result<()> {
    let remover = Remover::from_model_path("u2netp.onnx", 320)?
        .with_background(Rgb::WHITE);
    let image = load_image(Path::new("photo.jpg"))?;
    let cutout = remover.remove_background(&image)?;
    cutout.save("cutout.png")?;
    Ok(())
}
```

Smart crop from any mask
------------------------
```rust,no_run
use bgcrop::{CropConfig, MaskStrategy, smart_crop_from_mask, load_image};
use std::path::Path;

fn main() -> bgcrop::Result<()> {
    let image = load_image(Path::new("product.png"))?;
    let config = CropConfig { margin_percent: 0.1, square_crop: true, ..CropConfig::default() };
    let cropped = smart_crop_from_mask(&image, &MaskStrategy::Auto, &config)?;
    cropped.save("product_crop.png")?;
    Ok(())
}
```

Bring your own model
--------------------
Implement [`InferenceEngine`] to plug in any runtime; it receives a normalized
`1 × 3 × S × S` tensor and returns `S × S` logits.

Batch helpers
-------------
```rust,no_run
use std::path::Path;
use bgcrop::{process_directory_to_path, MaskSource, ProcessingMode, ProcessingParams};

fn main() -> bgcrop::Result<()> {
    let params = ProcessingParams {
        mode: ProcessingMode::Crop,
        mask_source: MaskSource::Auto,
        ..ProcessingParams::default()
    };
    let report = process_directory_to_path(
        Path::new("/data/photos"),
        Path::new("/out"),
        &params,
        None,
        true, // continue_on_error
    )?;
    println!("processed={} skipped={} errors={}", report.processed, report.skipped, report.errors);
    Ok(())
}
```

Error handling
--------------
All public functions return `bgcrop::Result<T>`. `Error::NoObjectDetected` and
`Error::InvalidMask` come from the crop stage; `Error::Inference` carries engine
failures unchanged.

Feature flags
-------------
- `onnx` (default): `TractEngine` and `Remover::from_model_path` via tract-onnx.
- `full`: everything.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::{CropConfig, DEFAULT_INPUT_SIZE, Normalization, ProcessingParams};
pub use error::{Error, Result};
pub use types::{MaskSource, OutputFormat, ProcessingMode, Rgb};

// Engines
#[cfg(feature = "onnx")]
pub use crate::core::engine::TractEngine;
pub use crate::core::engine::InferenceEngine;

// Processing stages
pub use crate::core::processing::composite::{composite_over, composite_parallel};
pub use crate::core::processing::crop::{
    CropRect, ObjectBounds, compute_crop_rect, crop, detect_object_bounds, smart_crop_from_mask,
};
pub use crate::core::processing::mask::{
    Mask, MaskStrategy, auto_mask, mask_from_alpha, mask_from_background, mask_from_edges,
    to_grayscale,
};
pub use crate::core::processing::ops::clamp;
pub use crate::core::processing::otsu::{SigmoidLut, otsu_threshold};
pub use crate::core::processing::upsample::MaskUpsampler;

// I/O
pub use io::load_image;

// High-level API re-exports
pub use api::{
    BatchReport, ProcessedImage, Remover, iterate_images, process_directory_to_path,
    process_file_to_path, process_image,
};
