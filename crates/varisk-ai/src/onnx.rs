//! ONNX Runtime backend for scikit-learn classifiers.
//!
//! Expects a model exported with skl2onnx and `zipmap=False`: one float input
//! of shape `[N, n_features]`, output 0 holding int64 labels `[N]` and output 1
//! holding float probabilities `[N, 2]`.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;
use varisk_core::ModelError;

use crate::model::Model;

/// Binary classifier served by ONNX Runtime.
pub struct OnnxModel {
    // `Session::run` needs `&mut`; the lock keeps `Model` usable through `&self`.
    session: Mutex<Session>,
    input_name: String,
    n_features: Option<usize>,
}

impl OnnxModel {
    /// Load a classifier from a `.onnx` file.
    pub fn load(model_path: &Path) -> ort::Result<Self> {
        let session = Session::builder()?.commit_from_file(model_path)?;

        let input = &session.inputs()[0];
        let input_name = input.name().to_string();
        let n_features = infer_width(input.dtype());

        info!(
            input = %input_name,
            n_features = ?n_features,
            model = %model_path.display(),
            "loaded onnx classifier"
        );
        Ok(Self {
            session: Mutex::new(session),
            input_name,
            n_features,
        })
    }

    /// Run one row, returning the raw label and the probability row.
    fn run(&self, features: &[f64]) -> Result<(i64, Vec<f64>), ModelError> {
        // skl2onnx exports float32 inputs.
        let row: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let shape = [1i64, row.len() as i64];
        let tensor = Tensor::from_array((shape, row.into_boxed_slice())).map_err(inference)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| ModelError::Inference("onnx session lock poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor])
            .map_err(inference)?;

        if outputs.len() < 2 {
            return Err(ModelError::MalformedOutput(format!(
                "expected label and probability outputs, got {}",
                outputs.len()
            )));
        }

        let (_, labels) = outputs[0].try_extract_tensor::<i64>().map_err(inference)?;
        let label = *labels
            .first()
            .ok_or_else(|| ModelError::MalformedOutput("empty label output".into()))?;

        let (prob_shape, probs) = outputs[1].try_extract_tensor::<f32>().map_err(inference)?;
        let dims: &[i64] = prob_shape;
        let width = dims.last().copied().unwrap_or(0).max(0) as usize;
        if width == 0 || probs.len() < width {
            return Err(ModelError::MalformedOutput(format!(
                "unexpected probability shape: {dims:?}"
            )));
        }
        let probabilities = probs[..width].iter().map(|&p| p as f64).collect();

        Ok((label, probabilities))
    }
}

impl Model for OnnxModel {
    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        self.run(features).map(|(label, _)| label)
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.run(features).map(|(_, probabilities)| probabilities)
    }
}

fn inference(e: ort::Error) -> ModelError {
    ModelError::Inference(e.to_string())
}

/// Try to infer the feature count from the model input type.
fn infer_width(input_type: &ort::value::ValueType) -> Option<usize> {
    match input_type {
        ort::value::ValueType::Tensor { shape, .. } => {
            // Last dimension is the feature count; the batch dimension is dynamic.
            shape
                .last()
                .and_then(|&d| if d > 0 { Some(d as usize) } else { None })
        }
        _ => None,
    }
}
