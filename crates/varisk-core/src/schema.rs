//! Column names, feature ordering, and the Arrow schema of a variant record.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema};

pub const CHROM: &str = "CHROM";
pub const POS: &str = "POS";
pub const REF: &str = "REF";
pub const ALT: &str = "ALT";
pub const AF_ESP: &str = "AF_ESP";
pub const AF_EXAC: &str = "AF_EXAC";
pub const AF_TGP: &str = "AF_TGP";
pub const SYMBOL: &str = "SYMBOL";
pub const IMPACT: &str = "IMPACT";
pub const CONSEQUENCE: &str = "Consequence";
pub const SIFT: &str = "SIFT";
pub const POLYPHEN: &str = "PolyPhen";
pub const CADD_PHRED: &str = "CADD_PHRED";
pub const CADD_RAW: &str = "CADD_RAW";
pub const BLOSUM62: &str = "BLOSUM62";

/// Number of positional inputs the classifier was trained on.
pub const N_FEATURES: usize = 15;

/// Positional input order of the classifier. The model has no field names,
/// so slot `i` of every feature vector must hold `FEATURE_ORDER[i]`.
pub const FEATURE_ORDER: [&str; N_FEATURES] = [
    CHROM,
    POS,
    REF,
    ALT,
    AF_ESP,
    AF_EXAC,
    AF_TGP,
    SYMBOL,
    IMPACT,
    CONSEQUENCE,
    SIFT,
    POLYPHEN,
    CADD_PHRED,
    CADD_RAW,
    BLOSUM62,
];

/// Columns that hold label-encoded strings at training time.
pub const CATEGORICAL_COLUMNS: [&str; 6] = [CHROM, REF, ALT, SYMBOL, IMPACT, CONSEQUENCE];

/// Order in which the input surface collects fields. Record batches built
/// from a [`VariantRecord`](crate::VariantRecord) use this column order.
pub const FORM_ORDER: [&str; N_FEATURES] = [
    CHROM,
    POS,
    REF,
    ALT,
    SYMBOL,
    IMPACT,
    CONSEQUENCE,
    AF_EXAC,
    AF_ESP,
    AF_TGP,
    SIFT,
    POLYPHEN,
    CADD_PHRED,
    CADD_RAW,
    BLOSUM62,
];

pub fn is_categorical(column: &str) -> bool {
    CATEGORICAL_COLUMNS.contains(&column)
}

/// Position of `column` in [`FEATURE_ORDER`].
pub fn feature_index(column: &str) -> Option<usize> {
    FEATURE_ORDER.iter().position(|c| *c == column)
}

/// Arrow data type of a raw (not yet encoded) column.
pub fn raw_data_type(column: &str) -> DataType {
    match column {
        POS | SIFT | POLYPHEN => DataType::Int64,
        c if is_categorical(c) => DataType::Utf8,
        _ => DataType::Float64,
    }
}

/// Schema of a single raw variant row, in form order.
pub fn variant_schema() -> Arc<Schema> {
    let fields: Vec<Field> = FORM_ORDER
        .iter()
        .map(|name| Field::new(*name, raw_data_type(name), false))
        .collect();
    Arc::new(Schema::new(fields))
}
