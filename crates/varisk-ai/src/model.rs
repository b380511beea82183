//! Binary classifier interface and the pure-Rust logistic backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use varisk_core::ModelError;

/// A trained positional binary classifier.
///
/// Implementations are read-only after loading and may be shared across
/// threads.
pub trait Model: Send + Sync {
    /// Number of inputs the model was trained on, if the artifact records it.
    fn n_features(&self) -> Option<usize>;

    /// Raw class for one feature vector: 0 = Benign, 1 = Pathogenic.
    fn predict(&self, features: &[f64]) -> Result<i64, ModelError>;

    /// Class probability distribution `[p_benign, p_pathogenic]`.
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;
}

/// A logistic artifact whose parts do not fit together.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidModel {
    #[error("no coefficients")]
    NoCoefficients,

    #[error("{name} has {actual} entries, coefficients have {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("scaler_mean and scaler_scale must be given together")]
    UnpairedScaler,

    #[error("scaler_scale contains zero")]
    ZeroScale,

    #[error("threshold {0} outside [0, 1]")]
    Threshold(f64),

    #[error("feature names {0:?} do not match the feature order")]
    FeatureOrder(Vec<String>),
}

fn default_threshold() -> f64 {
    0.5
}

/// Logistic regression with an optional standard scaler in front.
///
/// Serialized as JSON:
///
/// ```json
/// {
///   "feature_names": ["CHROM", "POS", ...],
///   "coefficients": [0.1, ...],
///   "intercept": -1.2,
///   "scaler_mean": [...],
///   "scaler_scale": [...],
///   "threshold": 0.5
/// }
/// ```
///
/// `feature_names`, the scaler, and `threshold` are optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler_mean: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler_scale: Option<Vec<f64>>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            feature_names: None,
            coefficients,
            intercept,
            scaler_mean: None,
            scaler_scale: None,
            threshold: default_threshold(),
        }
    }

    /// Check that the scaler and feature names agree with the coefficients.
    pub fn check_consistent(&self) -> Result<(), InvalidModel> {
        let expected = self.coefficients.len();
        if expected == 0 {
            return Err(InvalidModel::NoCoefficients);
        }
        let lengths = [
            ("scaler_mean", self.scaler_mean.as_ref().map(Vec::len)),
            ("scaler_scale", self.scaler_scale.as_ref().map(Vec::len)),
            ("feature_names", self.feature_names.as_ref().map(Vec::len)),
        ];
        for (name, actual) in lengths {
            if let Some(actual) = actual
                && actual != expected
            {
                return Err(InvalidModel::LengthMismatch {
                    name,
                    expected,
                    actual,
                });
            }
        }
        if self.scaler_mean.is_some() != self.scaler_scale.is_some() {
            return Err(InvalidModel::UnpairedScaler);
        }
        if let Some(scale) = &self.scaler_scale
            && scale.iter().any(|s| *s == 0.0)
        {
            return Err(InvalidModel::ZeroScale);
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(InvalidModel::Threshold(self.threshold));
        }
        Ok(())
    }

    /// Probability of the Pathogenic class.
    fn positive_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::Inference(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                features.len()
            )));
        }

        let mut z = self.intercept;
        for (i, (&x, &w)) in features.iter().zip(&self.coefficients).enumerate() {
            let x = match (&self.scaler_mean, &self.scaler_scale) {
                (Some(mean), Some(scale)) => (x - mean[i]) / scale[i],
                _ => x,
            };
            z += w * x;
        }

        Ok(sigmoid(z))
    }
}

impl Model for LogisticModel {
    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }

    fn predict(&self, features: &[f64]) -> Result<i64, ModelError> {
        let p = self.positive_probability(features)?;
        // Strict, so p == 0.5 is Benign like scikit-learn's `decision_function > 0`.
        Ok(if p > self.threshold { 1 } else { 0 })
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        let p = self.positive_probability(features)?;
        Ok(vec![1.0 - p, p])
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
