//! The segmentation model seam. Anything that maps a `1 × 3 × S × S` normalized tensor to
//! `S × S` logits can drive the pipeline; [`TractEngine`] runs an ONNX file with tract.
use ndarray::ArrayView4;

use crate::error::Result;

/// A segmentation model with a square input.
///
/// `infer` writes exactly `input_size()²` logits into `output` (which arrives cleared) and
/// returns engine failures unchanged as [`Error::Inference`](crate::Error::Inference).
pub trait InferenceEngine: Send {
    fn input_size(&self) -> u32;

    fn infer(&mut self, input: ArrayView4<'_, f32>, output: &mut Vec<f32>) -> Result<()>;
}

#[cfg(feature = "onnx")]
pub use tract::TractEngine;

#[cfg(feature = "onnx")]
mod tract {
    use std::path::Path;

    use ndarray::ArrayView4;
    use tract_onnx::prelude::*;
    use tracing::{debug, info, warn};

    use super::InferenceEngine;
    use crate::error::{Error, Result};

    type RunnableModel =
        SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

    /// ONNX model executed on the CPU by tract; the first graph output is the mask.
    pub struct TractEngine {
        runnable: RunnableModel,
        input_size: u32,
    }

    impl TractEngine {
        /// Load an ONNX graph with its input pinned to `1 × 3 × input_size × input_size`.
        ///
        /// Falls back to the decluttered (unoptimized) graph when optimization fails.
        pub fn load<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
            let path = model_path.as_ref();
            if !path.exists() {
                return Err(Error::Inference(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }

            let runnable = match load_runnable_model(path, input_size, true) {
                Ok(model) => model,
                Err(opt_err) => {
                    warn!(
                        "Model {} failed optimized load ({}); using decluttered graph",
                        path.display(),
                        opt_err
                    );
                    load_runnable_model(path, input_size, false)?
                }
            };
            info!("Loaded model {} ({}x{})", path.display(), input_size, input_size);

            Ok(Self {
                runnable,
                input_size,
            })
        }
    }

    impl InferenceEngine for TractEngine {
        fn input_size(&self) -> u32 {
            self.input_size
        }

        fn infer(&mut self, input: ArrayView4<'_, f32>, output: &mut Vec<f32>) -> Result<()> {
            let shape = input.shape().to_vec();
            let contiguous = input.as_standard_layout();
            let data = contiguous
                .as_slice()
                .ok_or_else(|| Error::inference("input tensor is not contiguous"))?;
            let tensor = Tensor::from_shape(&shape, data).map_err(Error::inference)?;

            let outputs = self
                .runnable
                .run(tvec![tensor.into()])
                .map_err(|e| Error::Inference(format!("model execution failed: {e}")))?;
            let first = outputs
                .first()
                .ok_or_else(|| Error::inference("model produced no outputs"))?;
            let values = first.as_slice::<f32>().map_err(Error::inference)?;
            debug!("Model output shape {:?}", first.shape());

            output.extend_from_slice(values);
            Ok(())
        }
    }

    fn load_runnable_model(path: &Path, input_size: u32, optimized: bool) -> Result<RunnableModel> {
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| {
                Error::Inference(format!("failed to parse ONNX graph {}: {e}", path.display()))
            })?
            .with_input_fact(0, f32::fact([1, 3, side, side]).into())
            .map_err(|e| Error::Inference(format!("unable to pin model input shape: {e}")))?;

        if optimized {
            model
                .into_optimized()
                .map_err(|e| Error::Inference(format!("unable to optimize graph: {e}")))?
                .into_runnable()
                .map_err(|e| Error::Inference(format!("unable to make graph runnable: {e}")))
        } else {
            model
                .into_typed()
                .map_err(|e| Error::Inference(format!("unable to type-check graph: {e}")))?
                .into_decluttered()
                .map_err(|e| Error::Inference(format!("unable to declutter graph: {e}")))?
                .into_runnable()
                .map_err(|e| Error::Inference(format!("unable to make graph runnable: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    struct Constant(u32);

    impl InferenceEngine for Constant {
        fn input_size(&self) -> u32 {
            self.0
        }

        fn infer(&mut self, input: ArrayView4<'_, f32>, output: &mut Vec<f32>) -> Result<()> {
            let (_, _, h, w) = input.dim();
            output.extend(std::iter::repeat(1.5).take(h * w));
            Ok(())
        }
    }

    #[test]
    fn engines_are_usable_as_trait_objects() {
        let mut engine: Box<dyn InferenceEngine> = Box::new(Constant(4));
        let input = Array4::<f32>::zeros((1, 3, 4, 4));
        let mut out = Vec::new();
        engine.infer(input.view(), &mut out).expect("infer");
        assert_eq!(engine.input_size(), 4);
        assert_eq!(out.len(), 16);
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn missing_model_file_is_an_inference_error() {
        let err = TractEngine::load("/nonexistent/model.onnx", 320).err().expect("load fails");
        assert!(matches!(err, crate::Error::Inference(_)));
    }
}
