//! Inference layer: label encoding, feature assembly, and classifier backends.

pub mod artifacts;
pub mod assembler;
pub mod encoder;
pub mod model;
pub mod predictor;

#[cfg(feature = "onnx")]
mod onnx;
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;

pub use artifacts::{ArtifactConfig, ArtifactLoadError};
pub use assembler::{FeatureValue, FeatureVector, assemble, assemble_batch};
pub use encoder::{
    CategoricalEncoder, ColumnEncoderError, EncoderSet, EncoderSummary, FallbackPolicy,
    InvalidEncoder, ParsePolicyError, category_text,
};
pub use model::{InvalidModel, LogisticModel, Model};
pub use predictor::Predictor;
pub use varisk_core::EncodeError;
