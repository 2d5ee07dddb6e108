use std::path::Path;

use anyhow::Context;
use tract_onnx::prelude::*;

use super::{preprocess, probability_from, Classifier, InferenceError, INPUT_SIZE};

/// Keras-exported network in ONNX form, channels-last input `[1, H, W, 1]`.
pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let side = INPUT_SIZE as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("read onnx model {}", path.display()))?
            .with_input_fact(0, f32::fact([1, side, side, 1]).into())
            .context("set input shape")?
            .into_optimized()
            .context("optimize model")?
            .into_runnable()
            .context("build execution plan")?;
        Ok(Self { plan })
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, image: &[u8]) -> Result<f32, InferenceError> {
        let side = INPUT_SIZE as usize;
        let pixels = preprocess(image)?;
        let input = Tensor::from_shape(&[1, side, side, 1], &pixels)
            .map_err(|e| InferenceError::Model(e.to_string()))?;

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::Model(e.to_string()))?;
        let first = outputs
            .first()
            .map(|t| t.to_array_view::<f32>().map(|v| v.iter().next().copied()))
            .transpose()
            .map_err(|e| InferenceError::Model(e.to_string()))?
            .flatten();
        probability_from(first)
    }
}
