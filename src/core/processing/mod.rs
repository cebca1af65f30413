//! Mask and image processing stages. Everything here is free of model specifics and works
//! on `image` buffers; the model-facing steps live in `preprocess` and `pipeline`.
pub mod composite;
pub mod crop;
pub mod mask;
pub mod ops;
pub mod otsu;
pub mod pipeline;
pub mod preprocess;
pub mod resize;
pub mod save;
pub mod upsample;
