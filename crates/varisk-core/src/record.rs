//! A single user-submitted variant observation.
//!
//! Records are built fresh for each prediction, turned into a single-row
//! Arrow [`RecordBatch`] keyed by column name, and discarded afterwards.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{self, variant_schema};

/// Predicted functional impact, as offered by the input surface's select box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Impact {
    Low,
    Moderate,
    High,
}

impl Impact {
    pub const ALL: [Impact; 3] = [Impact::Low, Impact::Moderate, Impact::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Impact {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MODERATE" => Ok(Self::Moderate),
            "HIGH" => Ok(Self::High),
            _ => Err(RecordError::UnknownImpact(s.to_string())),
        }
    }
}

/// Out-of-range input caught by the collecting surface.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("unknown impact {0:?}, expected LOW, MODERATE or HIGH")]
    UnknownImpact(String),

    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: i64,
    },
}

/// One genomic variant as entered by the user.
///
/// Field names serialize as the classifier's column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    #[serde(rename = "CHROM")]
    pub chrom: String,
    #[serde(rename = "POS")]
    pub pos: i64,
    #[serde(rename = "REF")]
    pub ref_allele: String,
    #[serde(rename = "ALT")]
    pub alt_allele: String,
    #[serde(rename = "AF_ESP")]
    pub af_esp: f64,
    #[serde(rename = "AF_EXAC")]
    pub af_exac: f64,
    #[serde(rename = "AF_TGP")]
    pub af_tgp: f64,
    #[serde(rename = "SYMBOL")]
    pub symbol: String,
    #[serde(rename = "IMPACT")]
    pub impact: Impact,
    #[serde(rename = "Consequence")]
    pub consequence: String,
    #[serde(rename = "SIFT")]
    pub sift: i64,
    #[serde(rename = "PolyPhen")]
    pub polyphen: i64,
    #[serde(rename = "CADD_PHRED")]
    pub cadd_phred: f64,
    #[serde(rename = "CADD_RAW")]
    pub cadd_raw: f64,
    #[serde(rename = "BLOSUM62")]
    pub blosum62: f64,
}

impl VariantRecord {
    /// Check the ranges the input surface enforces: `POS >= 1`,
    /// `SIFT` in {0, 1}, `PolyPhen` in {0, 1, 2}.
    ///
    /// Allele frequencies and scores are not constrained.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.pos < 1 {
            return Err(RecordError::OutOfRange {
                field: schema::POS,
                expected: ">= 1",
                value: self.pos,
            });
        }
        if !(0..=1).contains(&self.sift) {
            return Err(RecordError::OutOfRange {
                field: schema::SIFT,
                expected: "0 (tolerated) or 1 (deleterious)",
                value: self.sift,
            });
        }
        if !(0..=2).contains(&self.polyphen) {
            return Err(RecordError::OutOfRange {
                field: schema::POLYPHEN,
                expected: "0 (benign), 1 (possibly) or 2 (probably damaging)",
                value: self.polyphen,
            });
        }
        Ok(())
    }

    /// Build a single-row batch with raw (unencoded) values in form order.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let utf8 = |v: &str| Arc::new(StringArray::from(vec![v])) as ArrayRef;
        let int = |v: i64| Arc::new(Int64Array::from(vec![v])) as ArrayRef;
        let float = |v: f64| Arc::new(Float64Array::from(vec![v])) as ArrayRef;

        // Must follow schema::FORM_ORDER; try_new rejects a type mismatch.
        let columns = vec![
            utf8(&self.chrom),
            int(self.pos),
            utf8(&self.ref_allele),
            utf8(&self.alt_allele),
            utf8(&self.symbol),
            utf8(self.impact.as_str()),
            utf8(&self.consequence),
            float(self.af_exac),
            float(self.af_esp),
            float(self.af_tgp),
            int(self.sift),
            int(self.polyphen),
            float(self.cadd_phred),
            float(self.cadd_raw),
            float(self.blosum62),
        ];
        RecordBatch::try_new(variant_schema(), columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;

    fn brca1() -> VariantRecord {
        VariantRecord {
            chrom: "17".into(),
            pos: 41245466,
            ref_allele: "G".into(),
            alt_allele: "A".into(),
            af_esp: 0.0001,
            af_exac: 0.0002,
            af_tgp: 0.0,
            symbol: "BRCA1".into(),
            impact: Impact::High,
            consequence: "missense_variant".into(),
            sift: 1,
            polyphen: 2,
            cadd_phred: 32.0,
            cadd_raw: 5.2,
            blosum62: -2.0,
        }
    }

    #[test]
    fn impact_parses_case_insensitively() {
        assert_eq!("high".parse::<Impact>().unwrap(), Impact::High);
        assert_eq!(" Moderate ".parse::<Impact>().unwrap(), Impact::Moderate);
        assert!(matches!(
            "SEVERE".parse::<Impact>(),
            Err(RecordError::UnknownImpact(_))
        ));
    }

    #[test]
    fn validate_accepts_form_ranges() {
        assert!(brca1().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut r = brca1();
        r.pos = 0;
        assert!(matches!(
            r.validate(),
            Err(RecordError::OutOfRange { field: "POS", .. })
        ));

        let mut r = brca1();
        r.sift = 2;
        assert!(matches!(
            r.validate(),
            Err(RecordError::OutOfRange { field: "SIFT", .. })
        ));

        let mut r = brca1();
        r.polyphen = -1;
        assert!(matches!(
            r.validate(),
            Err(RecordError::OutOfRange { field: "PolyPhen", .. })
        ));
    }

    #[test]
    fn record_batch_is_single_row_in_form_order() {
        let batch = brca1().to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert_eq!(batch.num_columns(), 15);
        assert_eq!(batch.schema().field(5).name(), "IMPACT");

        let impact = batch
            .column_by_name("IMPACT")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(impact.value(0), "HIGH");

        let pos = batch
            .column_by_name("POS")
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(pos.value(0), 41245466);
        assert!(!pos.is_null(0));
    }

    #[test]
    fn serializes_with_column_names() {
        let json = serde_json::to_value(brca1()).unwrap();
        assert_eq!(json["CHROM"], "17");
        assert_eq!(json["IMPACT"], "HIGH");
        assert_eq!(json["PolyPhen"], 2);

        let back: VariantRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, brca1());
    }
}
