//! Label encoders for the categorical columns.
//!
//! Each encoder holds the ordered classes learned at training time. A class's
//! code is its position in that list, matching scikit-learn's `LabelEncoder`
//! (`classes_` sorted, `transform` returns the index). Encoders are immutable
//! once loaded.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use arrow::array::{Array, ArrayRef};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use thiserror::Error;
use tracing::debug;
use varisk_core::{CATEGORICAL_COLUMNS, EncodeError};

/// What to do with a value outside an encoder's trained vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Substitute the encoder's first known class.
    #[default]
    FirstClass,
    /// Refuse the value with [`EncodeError::UnknownCategory`].
    Reject,
}

impl FallbackPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstClass => "first-class",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown fallback policy {0:?}, expected first-class or reject")]
pub struct ParsePolicyError(String);

impl FromStr for FallbackPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-class" | "first_class" => Ok(Self::FirstClass),
            "reject" => Ok(Self::Reject),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Reasons an encoder cannot be built from its class list.
#[derive(Debug, Error, PartialEq)]
pub enum InvalidEncoder {
    #[error("no classes")]
    Empty,

    #[error("duplicate class {0:?}")]
    Duplicate(String),
}

/// An [`InvalidEncoder`] tagged with the column it was built for.
#[derive(Debug, Error, PartialEq)]
#[error("invalid encoder for column {column}: {source}")]
pub struct ColumnEncoderError {
    pub column: String,
    #[source]
    pub source: InvalidEncoder,
}

/// Text form of every value in `values`, the form classes are matched on.
///
/// Arrow's Utf8 cast is the single stringification rule: a Float64 `17.0`
/// becomes `"17.0"` and an Int64 `17` becomes `"17"`, as the training
/// pipeline's `str()` did.
pub fn category_text(values: &dyn Array) -> Result<ArrayRef, ArrowError> {
    cast(values, &DataType::Utf8)
}

/// Label encoder for one categorical column.
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    column: String,
    classes: Vec<String>,
    codes: HashMap<String, i64>,
    policy: FallbackPolicy,
}

impl CategoricalEncoder {
    /// Build an encoder from its ordered class list.
    pub fn new(column: impl Into<String>, classes: Vec<String>) -> Result<Self, InvalidEncoder> {
        if classes.is_empty() {
            return Err(InvalidEncoder::Empty);
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), i as i64).is_some() {
                return Err(InvalidEncoder::Duplicate(class.clone()));
            }
        }

        Ok(Self {
            column: column.into(),
            classes,
            codes,
            policy: FallbackPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Known classes in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn known_values(&self) -> HashSet<&str> {
        self.classes.iter().map(|s| s.as_str()).collect()
    }

    /// The class substituted for unknown values under [`FallbackPolicy::FirstClass`].
    pub fn first_class(&self) -> &str {
        // Non-empty by construction.
        &self.classes[0]
    }

    /// Code of a known class.
    pub fn code_of(&self, class: &str) -> Option<i64> {
        self.codes.get(class).copied()
    }

    /// Encode a value's text form. Unknown values map to the code of
    /// [`first_class`](Self::first_class) whatever the policy; this never fails.
    pub fn encode(&self, value: &str) -> i64 {
        match self.code_of(value) {
            Some(code) => code,
            None => self.fallback_code(value),
        }
    }

    /// Encode under this encoder's policy. Only [`FallbackPolicy::Reject`]
    /// can return an error.
    pub fn try_encode(&self, value: &str) -> Result<i64, EncodeError> {
        if let Some(code) = self.code_of(value) {
            return Ok(code);
        }
        match self.policy {
            FallbackPolicy::FirstClass => Ok(self.fallback_code(value)),
            FallbackPolicy::Reject => Err(EncodeError::UnknownCategory {
                column: self.column.clone(),
                value: value.to_string(),
            }),
        }
    }

    fn fallback_code(&self, value: &str) -> i64 {
        let first = self.first_class();
        debug!(
            column = %self.column,
            value,
            fallback = first,
            "unknown category, substituting first class"
        );
        self.codes[first]
    }
}

/// Encoders keyed by column name, sharing one fallback policy.
#[derive(Debug, Clone, Default)]
pub struct EncoderSet {
    encoders: BTreeMap<String, CategoricalEncoder>,
    policy: FallbackPolicy,
}

/// Summary statistics for an EncoderSet.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSummary {
    pub columns: usize,
    pub total_classes: usize,
    pub policy: FallbackPolicy,
    /// Categorical model columns with no encoder; their raw values pass through.
    pub missing: Vec<&'static str>,
    /// Columns with an encoder that the model does not treat as categorical.
    pub extra: Vec<String>,
}

impl EncoderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `column → ordered classes`.
    pub fn from_classes(
        classes: BTreeMap<String, Vec<String>>,
    ) -> Result<Self, ColumnEncoderError> {
        let mut set = Self::new();
        for (column, classes) in classes {
            let encoder = CategoricalEncoder::new(column.clone(), classes)
                .map_err(|source| ColumnEncoderError { column, source })?;
            set.insert(encoder);
        }
        Ok(set)
    }

    /// Add an encoder. It takes on the set's policy.
    pub fn insert(&mut self, encoder: CategoricalEncoder) {
        let encoder = encoder.with_policy(self.policy);
        self.encoders.insert(encoder.column.clone(), encoder);
    }

    pub fn get(&self, column: &str) -> Option<&CategoricalEncoder> {
        self.encoders.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.encoders.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoricalEncoder> {
        self.encoders.values()
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Apply one fallback policy to every encoder, present and future.
    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        for encoder in self.encoders.values_mut() {
            encoder.policy = policy;
        }
        self
    }

    /// Categorical columns that have no encoder.
    pub fn missing_categorical(&self) -> Vec<&'static str> {
        CATEGORICAL_COLUMNS
            .iter()
            .copied()
            .filter(|c| !self.contains(c))
            .collect()
    }

    pub fn summary(&self) -> EncoderSummary {
        EncoderSummary {
            columns: self.encoders.len(),
            total_classes: self.encoders.values().map(|e| e.classes.len()).sum(),
            policy: self.policy,
            missing: self.missing_categorical(),
            extra: self
                .encoders
                .keys()
                .filter(|k| !CATEGORICAL_COLUMNS.contains(&k.as_str()))
                .cloned()
                .collect(),
        }
    }
}
