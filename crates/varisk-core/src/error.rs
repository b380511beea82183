use thiserror::Error;

/// A categorical value outside its encoder's trained classes, under a
/// policy that refuses to substitute one.
#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    #[error("unknown category {value:?} for column {column}")]
    UnknownCategory { column: String, value: String },
}

/// The feature vector does not match what the model accepts.
#[derive(Debug, Error, PartialEq)]
pub enum ModelInputError {
    #[error("expected {expected} features, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("feature {column} is not numeric: {value:?}")]
    NonNumeric { column: String, value: String },
}

/// The model backend failed or returned something unusable.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model returned class {0}, expected 0 or 1")]
    UnexpectedClass(i64),

    #[error("malformed model output: {0}")]
    MalformedOutput(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// Failure of a single prediction request. Never fatal for the process.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid model input: {0}")]
    Input(#[from] ModelInputError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
