//! Loading the trained model and encoder artifacts.
//!
//! Both are read once at startup. Any failure here is fatal for the process:
//! nothing can be predicted without them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use varisk_core::{FEATURE_ORDER, N_FEATURES};

use crate::encoder::{ColumnEncoderError, EncoderSet, FallbackPolicy};
use crate::model::{InvalidModel, LogisticModel, Model};

#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("artifact not found: {0}")]
    NotFound(PathBuf),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unsupported model format: {0} (expected .json or .onnx)")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    InvalidEncoder(#[from] ColumnEncoderError),

    #[error("no encoder for categorical column {0}")]
    MissingEncoder(String),

    #[error("invalid model: {0}")]
    InvalidModel(#[from] InvalidModel),

    #[error("model expects {actual} features, feature order has {expected}")]
    FeatureCount { expected: usize, actual: usize },

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Onnx(#[from] ort::Error),
}

/// Where to find the artifacts and how strictly to apply them.
#[derive(Debug, Clone)]
pub struct ArtifactConfig {
    pub model: PathBuf,
    pub encoders: PathBuf,
    /// Treat a categorical column without an encoder as a load error
    /// instead of passing its raw value through.
    pub strict_encoders: bool,
    /// What the encoders do with categories they were not trained on.
    pub fallback: FallbackPolicy,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("model/genomic_model.json"),
            encoders: PathBuf::from("encoders/encoders.json"),
            strict_encoders: false,
            fallback: FallbackPolicy::default(),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactLoadError> {
    if !path.exists() {
        return Err(ArtifactLoadError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| ArtifactLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ArtifactLoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the encoder set from a JSON object of `column → ordered classes`.
///
/// Missing categorical columns are logged; with `strict` the first one is
/// returned as [`ArtifactLoadError::MissingEncoder`].
pub fn load_encoders(path: &Path, strict: bool) -> Result<EncoderSet, ArtifactLoadError> {
    let classes: BTreeMap<String, Vec<String>> = read_json(path)?;
    let encoders = EncoderSet::from_classes(classes)?;

    let missing = encoders.missing_categorical();
    if let Some(first) = missing.first() {
        if strict {
            return Err(ArtifactLoadError::MissingEncoder(first.to_string()));
        }
        warn!(
            columns = ?missing,
            "categorical columns without an encoder; raw values will be passed to the model"
        );
    }

    info!(
        columns = encoders.len(),
        classes = encoders.summary().total_classes,
        path = %path.display(),
        "loaded encoders"
    );
    Ok(encoders)
}

/// Load a classifier, choosing the backend by file extension.
pub fn load_model(path: &Path) -> Result<Box<dyn Model>, ArtifactLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let model: Box<dyn Model> = match ext.as_deref() {
        Some("json") => Box::new(load_logistic(path)?),
        #[cfg(feature = "onnx")]
        Some("onnx") => {
            if !path.exists() {
                return Err(ArtifactLoadError::NotFound(path.to_path_buf()));
            }
            Box::new(crate::onnx::OnnxModel::load(path)?)
        }
        _ => return Err(ArtifactLoadError::UnsupportedFormat(path.to_path_buf())),
    };

    if let Some(actual) = model.n_features()
        && actual != N_FEATURES
    {
        return Err(ArtifactLoadError::FeatureCount {
            expected: N_FEATURES,
            actual,
        });
    }

    Ok(model)
}

fn load_logistic(path: &Path) -> Result<LogisticModel, ArtifactLoadError> {
    let model: LogisticModel = read_json(path)?;
    model.check_consistent()?;

    if let Some(names) = &model.feature_names
        && names.iter().map(String::as_str).ne(FEATURE_ORDER)
    {
        return Err(InvalidModel::FeatureOrder(names.clone()).into());
    }

    info!(
        n_features = model.coefficients.len(),
        threshold = model.threshold,
        path = %path.display(),
        "loaded logistic classifier"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::InvalidEncoder;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn json_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    const ALL_ENCODERS: &str = r#"{
        "CHROM": ["1", "17", "X"],
        "REF": ["A", "C", "G", "T"],
        "ALT": ["A", "C", "G", "T"],
        "SYMBOL": ["BRCA1", "TP53"],
        "IMPACT": ["HIGH", "LOW", "MODERATE"],
        "Consequence": ["missense_variant", "stop_gained"]
    }"#;

    fn logistic_json(n: usize) -> String {
        let coefs = vec!["0.0"; n].join(", ");
        format!(r#"{{"coefficients": [{coefs}], "intercept": 0.0}}"#)
    }

    #[test]
    fn loads_encoders() {
        let f = json_file(".json", ALL_ENCODERS);
        let encoders = load_encoders(f.path(), true).unwrap();
        assert_eq!(encoders.len(), 6);
        assert_eq!(encoders.get("CHROM").unwrap().encode("17"), 1);
        assert!(encoders.missing_categorical().is_empty());
    }

    #[test]
    fn missing_encoder_is_tolerated_unless_strict() {
        let f = json_file(".json", r#"{"CHROM": ["1"], "SYMBOL": ["BRCA1"]}"#);

        let lenient = load_encoders(f.path(), false).unwrap();
        assert_eq!(lenient.len(), 2);

        let err = load_encoders(f.path(), true).unwrap_err();
        assert!(matches!(err, ArtifactLoadError::MissingEncoder(ref c) if c == "REF"));
    }

    #[test]
    fn invalid_encoder_names_the_column() {
        let f = json_file(".json", r#"{"ALT": ["A", "A"]}"#);
        let err = load_encoders(f.path(), false).unwrap_err();
        assert!(matches!(
            err,
            ArtifactLoadError::InvalidEncoder(ColumnEncoderError {
                ref column,
                source: InvalidEncoder::Duplicate(_),
            }) if column == "ALT"
        ));
    }

    #[test]
    fn corrupt_encoders_fail_to_parse() {
        let f = json_file(".json", "{not json");
        assert!(matches!(
            load_encoders(f.path(), false),
            Err(ArtifactLoadError::Json { .. })
        ));
    }

    #[test]
    fn missing_files_are_reported() {
        let path = Path::new("/nonexistent/encoders.json");
        assert!(matches!(
            load_encoders(path, false),
            Err(ArtifactLoadError::NotFound(p)) if p == path
        ));
        assert!(matches!(
            load_model(Path::new("/nonexistent/model.json")),
            Err(ArtifactLoadError::NotFound(_))
        ));
    }

    #[test]
    fn loads_logistic_model() {
        let f = json_file(".json", &logistic_json(15));
        let model = load_model(f.path()).unwrap();
        assert_eq!(model.n_features(), Some(15));
    }

    #[test]
    fn rejects_wrong_feature_count() {
        let f = json_file(".json", &logistic_json(14));
        assert!(matches!(
            load_model(f.path()),
            Err(ArtifactLoadError::FeatureCount { expected: 15, actual: 14 })
        ));
    }

    #[test]
    fn rejects_misordered_feature_names() {
        let mut names: Vec<&str> = FEATURE_ORDER.to_vec();
        names.swap(4, 5);
        let json = serde_json::json!({
            "feature_names": names,
            "coefficients": vec![0.0; 15],
            "intercept": 0.0,
        });
        let f = json_file(".json", &json.to_string());
        assert!(matches!(
            load_model(f.path()),
            Err(ArtifactLoadError::InvalidModel(InvalidModel::FeatureOrder(_)))
        ));

        let json = serde_json::json!({
            "feature_names": FEATURE_ORDER,
            "coefficients": vec![0.0; 15],
            "intercept": 0.0,
        });
        let f = json_file(".json", &json.to_string());
        assert!(load_model(f.path()).is_ok());
    }

    #[test]
    fn rejects_unknown_extension() {
        let f = json_file(".pkl", "");
        assert!(matches!(
            load_model(f.path()),
            Err(ArtifactLoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn config_defaults_match_conventional_layout() {
        let cfg = ArtifactConfig::default();
        assert_eq!(cfg.model, PathBuf::from("model/genomic_model.json"));
        assert_eq!(cfg.encoders, PathBuf::from("encoders/encoders.json"));
        assert!(!cfg.strict_encoders);
        assert_eq!(cfg.fallback, FallbackPolicy::FirstClass);
    }

    #[test]
    fn inconsistent_logistic_model_is_invalid() {
        let json = serde_json::json!({
            "coefficients": vec![0.0; 15],
            "intercept": 0.0,
            "scaler_mean": vec![0.0; 15],
        });
        let f = json_file(".json", &json.to_string());
        assert!(matches!(
            load_model(f.path()),
            Err(ArtifactLoadError::InvalidModel(InvalidModel::UnpairedScaler))
        ));
    }
}
