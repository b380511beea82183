mod display;
mod form;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use varisk_ai::{ArtifactConfig, FallbackPolicy, Predictor};
use varisk_core::{Impact, VariantRecord};

#[derive(Parser)]
#[command(
    name = "varisk",
    version,
    about = "Predict whether a genetic mutation is Benign or Pathogenic"
)]
struct Cli {
    /// Trained classifier (.json logistic model, or .onnx with the `onnx` feature).
    #[arg(long, env = "VARISK_MODEL", default_value = "model/genomic_model.json")]
    model: PathBuf,

    /// Label encoders: JSON object of column -> ordered classes.
    #[arg(long, env = "VARISK_ENCODERS", default_value = "encoders/encoders.json")]
    encoders: PathBuf,

    /// Fail at startup if a categorical column has no encoder.
    #[arg(long, env = "VARISK_STRICT_ENCODERS")]
    strict_encoders: bool,

    /// Unknown categories: `first-class` substitutes the encoder's first
    /// class, `reject` fails the prediction.
    #[arg(long, env = "VARISK_FALLBACK", default_value = "first-class")]
    fallback: FallbackPolicy,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score one variant given on the command line.
    Predict {
        #[command(flatten)]
        variant: VariantArgs,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Prompt for each field interactively, then score the variant.
    Form {
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the loaded encoders and model.
    Inspect,
}

/// One flag per form field. Defaults match the form's initial values.
#[derive(Args)]
struct VariantArgs {
    /// Chromosome (e.g., 17).
    #[arg(long, default_value = "")]
    chrom: String,
    /// Genomic position.
    #[arg(long, default_value_t = 1)]
    pos: i64,
    /// Reference base (A/C/G/T).
    #[arg(long = "ref", default_value = "")]
    ref_allele: String,
    /// Alternate base (A/C/G/T).
    #[arg(long = "alt", default_value = "")]
    alt_allele: String,
    /// Gene symbol (e.g., BRCA1).
    #[arg(long, default_value = "")]
    symbol: String,
    /// LOW, MODERATE or HIGH.
    #[arg(long, default_value = "LOW")]
    impact: Impact,
    /// Consequence (e.g., missense_variant).
    #[arg(long, default_value = "")]
    consequence: String,
    #[arg(long, default_value_t = 0.0)]
    af_exac: f64,
    #[arg(long, default_value_t = 0.0)]
    af_esp: f64,
    #[arg(long, default_value_t = 0.0)]
    af_tgp: f64,
    /// 0 = tolerated, 1 = deleterious.
    #[arg(long, default_value_t = 0)]
    sift: i64,
    /// 0 = benign, 1 = possibly, 2 = probably damaging.
    #[arg(long, default_value_t = 0)]
    polyphen: i64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    cadd_phred: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    cadd_raw: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    blosum62: f64,
}

impl From<VariantArgs> for VariantRecord {
    fn from(a: VariantArgs) -> Self {
        Self {
            chrom: a.chrom,
            pos: a.pos,
            ref_allele: a.ref_allele,
            alt_allele: a.alt_allele,
            af_esp: a.af_esp,
            af_exac: a.af_exac,
            af_tgp: a.af_tgp,
            symbol: a.symbol,
            impact: a.impact,
            consequence: a.consequence,
            sift: a.sift,
            polyphen: a.polyphen,
            cadd_phred: a.cadd_phred,
            cadd_raw: a.cadd_raw,
            blosum62: a.blosum62,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::info!("varisk v{}", env!("CARGO_PKG_VERSION"));

    let config = ArtifactConfig {
        model: cli.model,
        encoders: cli.encoders,
        strict_encoders: cli.strict_encoders,
        fallback: cli.fallback,
    };
    // Artifacts are loaded before any input is collected.
    let predictor = Predictor::load(&config).context("loading model artifacts")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Predict { variant, json } => {
            let record = VariantRecord::from(variant);
            record.validate()?;
            score(&predictor, &record, json, &mut out)
        }
        Command::Form { json } => {
            let stdin = io::stdin();
            let record = form::Form::new(stdin.lock(), &mut out).collect()?;
            writeln!(out)?;
            score(&predictor, &record, json, &mut out)
        }
        Command::Inspect => {
            display::write_artifact_summary(&mut out, predictor.encoders(), predictor.model())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Run one prediction and render it. A failed prediction prints a notice
/// and exits non-zero; it never aborts with a panic.
fn score(
    predictor: &Predictor,
    record: &VariantRecord,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    let result = match predictor.run(record) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "prediction failed");
            writeln!(out, "{}", display::FAILURE_NOTICE)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    if json {
        let report = display::PredictionReport::new(&result);
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        let batch = record.to_record_batch()?;
        display::write_variant_card(out, &batch)?;
        display::write_prediction(out, &result)?;
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn predict_flags_build_a_record() {
        let cli = Cli::try_parse_from([
            "varisk",
            "predict",
            "--chrom",
            "17",
            "--pos",
            "41245466",
            "--ref",
            "G",
            "--alt",
            "A",
            "--symbol",
            "BRCA1",
            "--impact",
            "HIGH",
            "--consequence",
            "missense_variant",
            "--af-esp",
            "0.0001",
            "--sift",
            "1",
            "--polyphen",
            "2",
            "--cadd-phred",
            "32",
            "--blosum62",
            "-2",
        ])
        .unwrap();

        assert_eq!(cli.model, PathBuf::from("model/genomic_model.json"));
        assert_eq!(cli.fallback, FallbackPolicy::FirstClass);
        let Command::Predict { variant, json } = cli.command else {
            panic!("expected predict");
        };
        assert!(!json);
        let record = VariantRecord::from(variant);
        assert_eq!(record.ref_allele, "G");
        assert_eq!(record.impact, Impact::High);
        assert_eq!(record.blosum62, -2.0);
        assert_eq!(record.af_exac, 0.0);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn fallback_flag_selects_reject() {
        let cli = Cli::try_parse_from(["varisk", "--fallback", "reject", "inspect"]).unwrap();
        assert_eq!(cli.fallback, FallbackPolicy::Reject);
        assert!(Cli::try_parse_from(["varisk", "--fallback", "mode", "inspect"]).is_err());
    }

    #[test]
    fn unknown_impact_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["varisk", "predict", "--impact", "SEVERE"]).is_err());
    }
}
