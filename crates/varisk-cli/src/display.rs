//! Text rendering for variant cards, predictions, and encoder summaries.
//!
//! Renders a single-row RecordBatch as a grouped, human-readable card, then
//! the prediction block the input form used to show.

use std::io::{self, Write};

use arrow::array::{Array, LargeStringArray, StringArray};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use serde::Serialize;
use varisk_ai::{EncoderSet, Model};
use varisk_core::{CATEGORICAL_COLUMNS, PredictionResult, RiskLabel};

pub const DISCLAIMER: &str =
    "This tool is for educational and research purposes only. It is not a medical diagnosis.";

/// Shown instead of a prediction when inference fails for one request.
pub const FAILURE_NOTICE: &str =
    "Prediction failed: the model could not score this variant. Check the inputs and try again.";

// ── Card section groupings ──

const LOCUS: &[&str] = &["CHROM", "POS", "REF", "ALT"];

const ANNOTATION: &[&str] = &["SYMBOL", "IMPACT", "Consequence"];

const FREQUENCIES: &[&str] = &["AF_EXAC", "AF_ESP", "AF_TGP"];

const SCORES: &[&str] = &["SIFT", "PolyPhen", "CADD_PHRED", "CADD_RAW", "BLOSUM62"];

/// Print a variant row as a vertical card grouped by section.
pub fn write_variant_card(out: &mut impl Write, batch: &RecordBatch) -> io::Result<()> {
    let chrom = get_utf8(batch, "CHROM").unwrap_or_default();
    let ref_allele = get_utf8(batch, "REF").unwrap_or_default();
    let alt_allele = get_utf8(batch, "ALT").unwrap_or_default();
    let pos = cell(batch, "POS").unwrap_or_default();

    writeln!(out, "=== {chrom}:{pos} {ref_allele}>{alt_allele} ===")?;
    if let Some(symbol) = get_utf8(batch, "SYMBOL")
        && !symbol.is_empty()
    {
        writeln!(out, "{symbol}")?;
    }
    writeln!(out)?;

    write_section(out, batch, "Locus", LOCUS)?;
    write_section(out, batch, "Annotation", ANNOTATION)?;
    write_section(out, batch, "Population Frequency", FREQUENCIES)?;
    write_section(out, batch, "Pathogenicity Scores", SCORES)?;
    Ok(())
}

/// Print the prediction block: label, rounded risk score, and disclaimer.
pub fn write_prediction(out: &mut impl Write, result: &PredictionResult) -> io::Result<()> {
    writeln!(out, "---")?;
    let verdict = match result.label {
        RiskLabel::Pathogenic => "Pathogenic Mutation",
        RiskLabel::Benign => "Benign Mutation",
    };
    writeln!(out, "Prediction: {verdict}")?;
    writeln!(out, "Risk Score: {:.3}", result.risk_score())?;
    writeln!(out)?;
    writeln!(out, "{DISCLAIMER}")?;
    Ok(())
}

/// JSON form of a prediction.
#[derive(Debug, Serialize)]
pub struct PredictionReport {
    pub label: RiskLabel,
    pub probability: f64,
    pub risk_score: f64,
    pub predicted_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionReport {
    pub fn new(result: &PredictionResult) -> Self {
        Self {
            label: result.label,
            probability: result.probability,
            risk_score: result.risk_score(),
            predicted_at: chrono::Utc::now(),
        }
    }
}

/// Print what was loaded: encoders per column and the model's input width.
pub fn write_artifact_summary(
    out: &mut impl Write,
    encoders: &EncoderSet,
    model: &dyn Model,
) -> io::Result<()> {
    let summary = encoders.summary();

    writeln!(out, "Encoders")?;
    writeln!(
        out,
        "  {:<14} {:>8}  {}",
        "column", "classes", "fallback (first class)"
    )?;
    for column in CATEGORICAL_COLUMNS {
        match encoders.get(column) {
            Some(enc) => writeln!(
                out,
                "  {:<14} {:>8}  {}",
                column,
                enc.classes().len(),
                enc.first_class()
            )?,
            None => writeln!(out, "  {:<14} {:>8}  (missing: raw pass-through)", column, "-")?,
        }
    }
    for column in &summary.extra {
        writeln!(out, "  {column:<14} (not a model column, ignored)")?;
    }
    writeln!(
        out,
        "  {} encoders, {} classes total, unknown categories: {}",
        summary.columns, summary.total_classes, summary.policy
    )?;
    writeln!(out)?;

    writeln!(out, "Model")?;
    match model.n_features() {
        Some(n) => writeln!(out, "  {:<14} {}", "features", n)?,
        None => writeln!(out, "  {:<14} (not recorded in artifact)", "features")?,
    }
    Ok(())
}

// ── Section rendering ──

fn write_section(
    out: &mut impl Write,
    batch: &RecordBatch,
    header: &str,
    cols: &[&str],
) -> io::Result<()> {
    writeln!(out, "{header}")?;
    for &col_name in cols {
        if let Some(value) = cell(batch, col_name) {
            writeln!(out, "  {:<14} {}", col_name, value)?;
        }
    }
    writeln!(out)
}

// ── Helpers ──

/// Format one cell with Arrow's display rules; `None` for absent or null.
fn cell(batch: &RecordBatch, col_name: &str) -> Option<String> {
    let idx = batch.schema().index_of(col_name).ok()?;
    let col = batch.column(idx);
    if col.is_null(0) {
        return None;
    }
    let options = FormatOptions::default();
    let formatter = ArrayFormatter::try_new(col.as_ref(), &options).ok()?;
    Some(formatter.value(0).to_string())
}

fn get_utf8(batch: &RecordBatch, col_name: &str) -> Option<String> {
    let idx = batch.schema().index_of(col_name).ok()?;
    let col = batch.column(idx);
    if col.is_null(0) {
        return None;
    }
    // Try Utf8 first, then LargeUtf8.
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        return Some(arr.value(0).to_string());
    }
    if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        return Some(arr.value(0).to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use varisk_ai::LogisticModel;
    use varisk_core::{Impact, VariantRecord};

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

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
    fn card_groups_fields_by_section() {
        let batch = brca1().to_record_batch().unwrap();
        let text = render(|out| write_variant_card(out, &batch));

        assert!(text.starts_with("=== 17:41245466 G>A ===\nBRCA1\n"));
        let locus = text.find("Locus").unwrap();
        let scores = text.find("Pathogenicity Scores").unwrap();
        assert!(locus < scores);
        assert!(text.contains("  IMPACT         HIGH"));
        assert!(text.contains("  BLOSUM62       -2"));
    }

    #[test]
    fn prediction_block_shows_label_and_rounded_score() {
        let result = PredictionResult {
            label: RiskLabel::Pathogenic,
            probability: 0.87654,
        };
        let text = render(|out| write_prediction(out, &result));
        assert!(text.contains("Prediction: Pathogenic Mutation"));
        assert!(text.contains("Risk Score: 0.877"));
        assert!(text.contains(DISCLAIMER));

        let result = PredictionResult {
            label: RiskLabel::Benign,
            probability: 0.1,
        };
        let text = render(|out| write_prediction(out, &result));
        assert!(text.contains("Prediction: Benign Mutation"));
        assert!(text.contains("Risk Score: 0.100"));
    }

    #[test]
    fn report_serializes_rounded_score() {
        let result = PredictionResult {
            label: RiskLabel::Benign,
            probability: 0.12345,
        };
        let json = serde_json::to_value(PredictionReport::new(&result)).unwrap();
        assert_eq!(json["label"], "Benign");
        assert_eq!(json["risk_score"], 0.123);
        assert!(json["predicted_at"].is_string());
    }

    #[test]
    fn summary_flags_missing_encoders() {
        let mut classes = BTreeMap::new();
        classes.insert("CHROM".to_string(), vec!["1".to_string(), "17".to_string()]);
        classes.insert("QUAL".to_string(), vec!["PASS".to_string()]);
        let encoders = EncoderSet::from_classes(classes).unwrap();
        let model = LogisticModel::new(vec![0.0; 15], 0.0);

        let text = render(|out| write_artifact_summary(out, &encoders, &model));
        assert!(text.contains("  CHROM                 2  1"));
        assert!(text.contains("SYMBOL"));
        assert!(text.contains("(missing: raw pass-through)"));
        assert!(text.contains("QUAL"));
        assert!(text.contains("unknown categories: first-class"));
        assert!(text.contains("features       15"));
    }
}
