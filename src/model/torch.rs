use std::{path::Path, sync::Mutex};

use anyhow::Context;
use tch::{CModule, Device, Tensor};

use super::{preprocess, probability_from, Classifier, InferenceError, INPUT_SIZE};

/// TorchScript export of the network, channels-first input `[1, 1, H, W]`.
pub struct TorchClassifier {
    module: Mutex<CModule>,
}

impl TorchClassifier {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let module = CModule::load_on_device(path, Device::Cpu)
            .with_context(|| format!("load torchscript module {}", path.display()))?;
        Ok(Self {
            module: Mutex::new(module),
        })
    }
}

impl Classifier for TorchClassifier {
    fn classify(&self, image: &[u8]) -> Result<f32, InferenceError> {
        let side = i64::from(INPUT_SIZE);
        let pixels = preprocess(image)?;
        let input = Tensor::from_slice(&pixels).view([1, 1, side, side]);

        let module = self
            .module
            .lock()
            .map_err(|_| InferenceError::Model("model mutex poisoned".into()))?;
        let output = module
            .forward_ts(&[input])
            .map_err(|e| InferenceError::Model(e.to_string()))?;
        let flat = output.view([-1]);
        let first = (flat.size1().unwrap_or(0) > 0).then(|| flat.double_value(&[0]) as f32);
        probability_from(first)
    }
}
