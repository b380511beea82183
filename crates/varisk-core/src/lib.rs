pub mod error;
pub mod prediction;
pub mod record;
pub mod schema;

pub use error::{EncodeError, ModelError, ModelInputError, PredictError};
pub use prediction::{PredictionResult, RiskLabel};
pub use record::{Impact, RecordError, VariantRecord};
pub use schema::{CATEGORICAL_COLUMNS, FEATURE_ORDER, FORM_ORDER, N_FEATURES};
