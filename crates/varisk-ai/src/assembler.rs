//! Feature assembly: turns one variant row into the classifier's positional input.
//!
//! The row is held as a single-row Arrow [`RecordBatch`] keyed by column name.
//! Categorical columns are label-encoded in place, then the batch is projected
//! into [`FEATURE_ORDER`]. Column order of the input batch does not matter.

use std::ops::Deref;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, LargeStringArray, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use tracing::debug;
use varisk_core::schema::{feature_index, is_categorical};
use varisk_core::{FEATURE_ORDER, PredictError, VariantRecord};

use crate::encoder::{EncoderSet, category_text};

/// One slot of an assembled feature vector.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Number(f64),
    /// A categorical value that had no encoder and was passed through as-is.
    Raw(String),
}

impl FeatureValue {
    /// Numeric value of the slot. Raw text is accepted if it parses as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Raw(s) => s.trim().parse().ok(),
        }
    }
}

/// Feature values in [`FEATURE_ORDER`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<FeatureValue>);

impl FeatureVector {
    /// Look up a slot by column name.
    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        feature_index(column).and_then(|i| self.0.get(i))
    }
}

impl Deref for FeatureVector {
    type Target = [FeatureValue];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Assemble a user-entered record into a feature vector.
pub fn assemble(
    record: &VariantRecord,
    encoders: &EncoderSet,
) -> Result<FeatureVector, PredictError> {
    let batch = record.to_record_batch()?;
    assemble_batch(&batch, encoders)
}

/// Assemble a single-row batch keyed by column name.
///
/// Every column in [`FEATURE_ORDER`] must be present; extra columns are
/// dropped. Categorical columns without an encoder keep their raw value.
/// Unknown categories follow the encoder set's fallback policy.
pub fn assemble_batch(
    batch: &RecordBatch,
    encoders: &EncoderSet,
) -> Result<FeatureVector, PredictError> {
    if batch.num_rows() != 1 {
        return Err(ArrowError::InvalidArgumentError(format!(
            "expected a single row, got {}",
            batch.num_rows()
        ))
        .into());
    }

    let encoded = encode_categorical(batch, encoders)?;

    let schema = encoded.schema();
    let indices = FEATURE_ORDER
        .iter()
        .map(|name| schema.index_of(name))
        .collect::<Result<Vec<_>, _>>()?;
    let ordered = encoded.project(&indices)?;

    let values = FEATURE_ORDER
        .iter()
        .zip(ordered.columns())
        .map(|(name, col)| cell_value(col.as_ref(), name))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureVector(values))
}

/// Replace each categorical column that has an encoder with its Int64 codes.
fn encode_categorical(
    batch: &RecordBatch,
    encoders: &EncoderSet,
) -> Result<RecordBatch, PredictError> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = Vec::with_capacity(schema.fields().len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());

    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        let name = field.name();
        let encoder = match encoders.get(name) {
            Some(encoder) if is_categorical(name) => encoder,
            _ => {
                if is_categorical(name) {
                    debug!(column = %name, "no encoder, passing raw value through");
                }
                fields.push(field.as_ref().clone());
                columns.push(Arc::clone(column));
                continue;
            }
        };

        let text = category_text(column.as_ref())?;
        let codes = (0..text.len())
            .map(|row| {
                get_string(text.as_ref(), row)
                    .map(|v| encoder.try_encode(&v))
                    .transpose()
            })
            .collect::<Result<Int64Array, _>>()?;

        fields.push(Field::new(name, DataType::Int64, field.is_nullable()));
        columns.push(Arc::new(codes));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn cell_value(col: &dyn Array, column: &str) -> Result<FeatureValue, ArrowError> {
    if col.is_null(0) {
        return Err(ArrowError::InvalidArgumentError(format!(
            "null value in column {column}"
        )));
    }

    if let Some(s) = get_string(col, 0) {
        return Ok(FeatureValue::Raw(s));
    }

    let numeric = cast(col, &DataType::Float64)?;
    let values = numeric
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| ArrowError::CastError(format!("column {column} is not numeric")))?;
    Ok(FeatureValue::Number(values.value(0)))
}

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}
