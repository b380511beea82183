//! The inference context: a loaded model plus its encoders.
//!
//! A [`Predictor`] is built once and only read afterwards, so it can be shared
//! by reference across requests. Each call assembles a fresh feature vector
//! and returns one [`PredictionResult`].

use tracing::debug;
use varisk_core::{
    FEATURE_ORDER, ModelError, ModelInputError, N_FEATURES, PredictError, PredictionResult,
    RiskLabel, VariantRecord,
};

use crate::artifacts::{self, ArtifactConfig, ArtifactLoadError};
use crate::assembler::{self, FeatureValue, FeatureVector};
use crate::encoder::EncoderSet;
use crate::model::Model;

/// Slack for float32 rounding in backend probabilities before they are
/// treated as outside [0, 1].
const PROBABILITY_TOLERANCE: f64 = 1e-6;

pub struct Predictor {
    model: Box<dyn Model>,
    encoders: EncoderSet,
}

impl Predictor {
    pub fn new(model: Box<dyn Model>, encoders: EncoderSet) -> Self {
        Self { model, encoders }
    }

    /// Load both artifacts named by `config` and apply its fallback policy.
    pub fn load(config: &ArtifactConfig) -> Result<Self, ArtifactLoadError> {
        let encoders = artifacts::load_encoders(&config.encoders, config.strict_encoders)?
            .with_policy(config.fallback);
        let model = artifacts::load_model(&config.model)?;
        Ok(Self::new(model, encoders))
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    /// Build the positional feature vector for one record.
    pub fn assemble(&self, record: &VariantRecord) -> Result<FeatureVector, PredictError> {
        assembler::assemble(record, &self.encoders)
    }

    /// Classify an assembled vector.
    ///
    /// The vector must hold exactly [`N_FEATURES`] numeric slots; a raw
    /// pass-through slot is accepted only if its text parses as a number.
    pub fn predict(&self, vector: &[FeatureValue]) -> Result<PredictionResult, PredictError> {
        let features = numeric_features(vector)?;

        let class = self.model.predict(&features)?;
        let label = RiskLabel::from_class(class).ok_or(ModelError::UnexpectedClass(class))?;

        let proba = self.model.predict_proba(&features)?;
        let raw = *proba.get(1).ok_or_else(|| {
            ModelError::MalformedOutput(format!(
                "expected two class probabilities, got {}",
                proba.len()
            ))
        })?;
        let probability = clamp_probability(raw)?;

        debug!(%label, probability, "prediction");
        Ok(PredictionResult { label, probability })
    }

    /// Assemble and classify one record.
    pub fn run(&self, record: &VariantRecord) -> Result<PredictionResult, PredictError> {
        let vector = self.assemble(record)?;
        self.predict(&vector)
    }
}

fn clamp_probability(p: f64) -> Result<f64, ModelError> {
    if (-PROBABILITY_TOLERANCE..=1.0 + PROBABILITY_TOLERANCE).contains(&p) {
        Ok(p.clamp(0.0, 1.0))
    } else {
        Err(ModelError::MalformedOutput(format!(
            "probability {p} outside [0, 1]"
        )))
    }
}

fn numeric_features(vector: &[FeatureValue]) -> Result<Vec<f64>, ModelInputError> {
    if vector.len() != N_FEATURES {
        return Err(ModelInputError::WrongLength {
            expected: N_FEATURES,
            actual: vector.len(),
        });
    }

    FEATURE_ORDER
        .iter()
        .zip(vector)
        .map(|(column, value)| {
            value.as_f64().ok_or_else(|| ModelInputError::NonNumeric {
                column: column.to_string(),
                value: match value {
                    FeatureValue::Raw(s) => s.clone(),
                    FeatureValue::Number(v) => v.to_string(),
                },
            })
        })
        .collect()
}
