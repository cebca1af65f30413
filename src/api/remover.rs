use std::sync::Mutex;

use image::{DynamicImage, GrayImage, RgbaImage};
use tracing::{debug, info};

use crate::core::engine::InferenceEngine;
use crate::core::params::{CropConfig, Normalization};
use crate::core::pool::TensorPool;
use crate::core::processing::composite::composite_over;
use crate::core::processing::crop::crop;
use crate::core::processing::otsu::SigmoidLut;
use crate::core::processing::pipeline::binarize_logits;
use crate::core::processing::preprocess::preprocess_into;
use crate::core::processing::upsample::MaskUpsampler;
use crate::error::{Error, Result};
use crate::types::Rgb;

/// Background removal and smart crop driven by a segmentation model.
///
/// One `Remover` can be shared across threads: inference is serialized on an internal
/// lock, while preprocessing, compositing and the scratch pools run concurrently.
pub struct Remover {
    engine: Mutex<Box<dyn InferenceEngine>>,
    input_size: u32,
    normalization: Normalization,
    background: Rgb,
    lut: &'static SigmoidLut,
    tensors: TensorPool,
    upsampler: MaskUpsampler,
}

impl Remover {
    pub fn new(engine: Box<dyn InferenceEngine>) -> Self {
        let input_size = engine.input_size();
        Self {
            engine: Mutex::new(engine),
            input_size,
            normalization: Normalization::IMAGENET,
            background: Rgb::WHITE,
            lut: SigmoidLut::shared(),
            tensors: TensorPool::new(),
            upsampler: MaskUpsampler::new(),
        }
    }

    /// Load an ONNX model with tract.
    #[cfg(feature = "onnx")]
    pub fn from_model_path<P: AsRef<std::path::Path>>(path: P, input_size: u32) -> Result<Self> {
        let engine = crate::core::engine::TractEngine::load(path, input_size)?;
        Ok(Self::new(Box::new(engine)))
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn with_background(mut self, background: Rgb) -> Self {
        self.background = background;
        self
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn tensor_pool(&self) -> &TensorPool {
        &self.tensors
    }

    /// Binary 0/255 mask at model resolution (`input_size × input_size`).
    pub fn predict_mask(&self, image: &DynamicImage) -> Result<GrayImage> {
        let side = self.input_size;
        let mut bufs = self.tensors.take();
        bufs.prepare(side as usize);
        let bufs = &mut *bufs;

        preprocess_into(image, side, &self.normalization, &mut bufs.input)?;
        {
            let mut engine = self
                .engine
                .lock()
                .map_err(|_| Error::inference("inference engine lock poisoned"))?;
            engine.infer(bufs.input.view(), &mut bufs.output)?;
        }
        debug!("Inference produced {} values", bufs.output.len());

        binarize_logits(self.lut, &bufs.output, side)
    }

    /// Model mask resized to the image and softened at the edges.
    pub fn refined_mask(&self, image: &DynamicImage) -> Result<GrayImage> {
        let mask = self.predict_mask(image)?;
        Ok(self
            .upsampler
            .upsample(&mask, image.width(), image.height()))
    }

    /// Subject composited over the configured background at the original size.
    pub fn remove_background(&self, image: &DynamicImage) -> Result<RgbaImage> {
        self.remove_background_over(image, self.background)
    }

    pub fn remove_background_over(
        &self,
        image: &DynamicImage,
        background: Rgb,
    ) -> Result<RgbaImage> {
        let mask = self.refined_mask(image)?;
        let out = composite_over(image, &mask, background)?;
        info!(
            "Removed background from {}x{} image",
            image.width(),
            image.height()
        );
        Ok(out)
    }

    /// Crop around the subject the model finds.
    pub fn smart_crop(&self, image: &DynamicImage, config: &CropConfig) -> Result<RgbaImage> {
        let mask = self.predict_mask(image)?;
        let side = self.input_size as f64;
        let scale_x = image.width() as f64 / side;
        let scale_y = image.height() as f64 / side;
        crop(image, Some(&mask), config, scale_x, scale_y)
    }
}
