//! Boundary around the externally trained pneumonia classifier.
//!
//! The network itself is a black box: it takes a single-channel
//! 500x500 image scaled to `[0, 1]` and yields one probability.
//! Which backend runs it is decided by the artifact's file extension.

use std::{fmt, path::Path, sync::Arc};

use thiserror::Error;
use tracing::info;

#[cfg(feature = "onnx")]
mod onnx;
mod preprocess;
#[cfg(feature = "torch")]
mod torch;

pub use preprocess::{preprocess, INPUT_SIZE};

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("cannot decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("model error: {0}")]
    Model(String),
}

/// A loaded model, shared read-only by every request.
pub trait Classifier: Send + Sync {
    /// Probability in `[0, 1]` that the image shows pneumonia.
    fn classify(&self, image: &[u8]) -> Result<f32, InferenceError>;
}

pub fn load(path: &Path) -> anyhow::Result<Arc<dyn Classifier>> {
    anyhow::ensure!(path.is_file(), "model not found at {}", path.display());

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let classifier: Arc<dyn Classifier> = match ext.as_str() {
        #[cfg(feature = "onnx")]
        "onnx" => Arc::new(onnx::OnnxClassifier::load(path)?),
        #[cfg(feature = "torch")]
        "pt" | "ts" => Arc::new(torch::TorchClassifier::load(path)?),
        other => anyhow::bail!(
            "unsupported model format {:?} (enabled backends: {})",
            other,
            enabled_backends()
        ),
    };
    info!(path = %path.display(), "model loaded");
    Ok(classifier)
}

fn enabled_backends() -> &'static str {
    match (cfg!(feature = "onnx"), cfg!(feature = "torch")) {
        (true, true) => "onnx, torch",
        (true, false) => "onnx",
        (false, true) => "torch",
        (false, false) => "none",
    }
}

/// Turns the first value of a model output into a probability.
#[allow(dead_code)]
pub(crate) fn probability_from(output: Option<f32>) -> Result<f32, InferenceError> {
    match output {
        Some(p) if p.is_finite() => Ok(p.clamp(0.0, 1.0)),
        Some(p) => Err(InferenceError::Model(format!("non-finite output {}", p))),
        None => Err(InferenceError::Model("empty output tensor".into())),
    }
}

/// Binary outcome derived from a probability with a 0.5 threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diagnosis {
    pub positive: bool,
    /// Percentage in `[50, 100]`.
    pub confidence: f64,
}

impl Diagnosis {
    pub fn from_probability(probability: f32) -> Self {
        let p = f64::from(probability).clamp(0.0, 1.0);
        if p >= 0.5 {
            Self {
                positive: true,
                confidence: p * 100.0,
            }
        } else {
            Self {
                positive: false,
                confidence: (1.0 - p) * 100.0,
            }
        }
    }

    pub fn label(&self) -> &'static str {
        if self.positive {
            "Positive for Pneumonia"
        } else {
            "Negative for Pneumonia"
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}%)", self.label(), self.confidence)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_at_and_above_threshold() {
        let d = Diagnosis::from_probability(0.5);
        assert!(d.positive);
        assert_eq!(d.confidence, 50.0);

        let d = Diagnosis::from_probability(0.82);
        assert!(d.positive);
        assert_eq!(d.to_string(), "Positive for Pneumonia (82.00%)");
    }

    #[test]
    fn negative_below_threshold() {
        let d = Diagnosis::from_probability(0.1);
        assert!(!d.positive);
        assert_eq!(d.to_string(), "Negative for Pneumonia (90.00%)");

        let d = Diagnosis::from_probability(0.0);
        assert_eq!(d.confidence, 100.0);
    }

    #[test]
    fn confidence_stays_within_bounds() {
        for i in 0..=1000 {
            let p = i as f32 / 1000.0;
            let d = Diagnosis::from_probability(p);
            assert!(
                (50.0..=100.0).contains(&d.confidence),
                "p={} confidence={}",
                p,
                d.confidence
            );
            assert_eq!(d.positive, p >= 0.5);
        }
    }

    #[test]
    fn out_of_range_probabilities_are_clamped() {
        assert_eq!(Diagnosis::from_probability(1.7).confidence, 100.0);
        assert_eq!(Diagnosis::from_probability(-0.3).confidence, 100.0);
        assert!(!Diagnosis::from_probability(-0.3).positive);
    }

    #[test]
    fn probability_from_rejects_bad_outputs() {
        assert_eq!(probability_from(Some(0.25)).unwrap(), 0.25);
        assert_eq!(probability_from(Some(3.0)).unwrap(), 1.0);
        assert!(matches!(
            probability_from(Some(f32::NAN)),
            Err(InferenceError::Model(_))
        ));
        assert!(matches!(probability_from(None), Err(InferenceError::Model(_))));
    }

    #[test]
    fn load_rejects_missing_or_unknown_artifacts() {
        let err = load(Path::new("/definitely/not/here.onnx")).err().unwrap();
        assert!(err.to_string().contains("model not found"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.h5");
        std::fs::write(&path, b"not a model").unwrap();
        let err = load(&path).err().unwrap();
        assert!(err.to_string().contains("unsupported model format"));
    }
}
