//! Interactive input form: prompts for each field in form order.
//!
//! An empty answer takes the field's initial value (empty text, zero, `LOW`,
//! position 1). Unparseable or out-of-range answers are re-asked.

use std::fmt::Display;
use std::io::{BufRead, Write};
use std::str::FromStr;

use anyhow::{Context, bail};
use varisk_core::{Impact, VariantRecord};

pub struct Form<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Form<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask for every field and build the record.
    pub fn collect(&mut self) -> anyhow::Result<VariantRecord> {
        let chrom = self.text("Chromosome (e.g., 17)")?;
        let pos = self.number("Position", 1i64, |v| {
            if *v >= 1 { Ok(()) } else { Err("must be at least 1".into()) }
        })?;
        let ref_allele = self.text("Reference Base (A/C/G/T)")?;
        let alt_allele = self.text("Alternate Base (A/C/G/T)")?;
        let symbol = self.text("Gene Symbol (e.g., BRCA1)")?;
        let impact = self.number("Impact [LOW/MODERATE/HIGH]", Impact::Low, |_| Ok(()))?;
        let consequence = self.text("Consequence (e.g., missense_variant)")?;

        let af_exac = self.float("AF_EXAC")?;
        let af_esp = self.float("AF_ESP")?;
        let af_tgp = self.float("AF_TGP")?;

        let sift = self.number("SIFT (0=tolerated, 1=deleterious)", 0i64, |v| {
            if (0..=1).contains(v) { Ok(()) } else { Err("must be 0 or 1".into()) }
        })?;
        let polyphen = self.number(
            "PolyPhen (0=benign, 1=possibly, 2=probably damaging)",
            0i64,
            |v| {
                if (0..=2).contains(v) { Ok(()) } else { Err("must be 0, 1 or 2".into()) }
            },
        )?;

        let cadd_phred = self.float("CADD_PHRED")?;
        let cadd_raw = self.float("CADD_RAW")?;
        let blosum62 = self.float("BLOSUM62")?;

        let record = VariantRecord {
            chrom,
            pos,
            ref_allele,
            alt_allele,
            af_esp,
            af_exac,
            af_tgp,
            symbol,
            impact,
            consequence,
            sift,
            polyphen,
            cadd_phred,
            cadd_raw,
            blosum62,
        };
        record.validate()?;
        Ok(record)
    }

    fn ask(&mut self, label: &str) -> anyhow::Result<String> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        let n = self
            .input
            .read_line(&mut line)
            .with_context(|| format!("reading {label}"))?;
        if n == 0 {
            bail!("input ended before {label} was entered");
        }
        Ok(line.trim().to_string())
    }

    fn text(&mut self, label: &str) -> anyhow::Result<String> {
        self.ask(label)
    }

    fn float(&mut self, label: &str) -> anyhow::Result<f64> {
        self.number(label, 0.0, |v: &f64| {
            if v.is_finite() { Ok(()) } else { Err("must be a finite number".into()) }
        })
    }

    fn number<T>(
        &mut self,
        label: &str,
        initial: T,
        check: impl Fn(&T) -> Result<(), String>,
    ) -> anyhow::Result<T>
    where
        T: FromStr + Display + Clone,
        T::Err: Display,
    {
        loop {
            let answer = self.ask(&format!("{label} [{initial}]"))?;
            if answer.is_empty() {
                return Ok(initial.clone());
            }
            match answer.parse::<T>() {
                Ok(v) => match check(&v) {
                    Ok(()) => return Ok(v),
                    Err(msg) => writeln!(self.output, "  {label} {msg}")?,
                },
                Err(e) => writeln!(self.output, "  invalid value {answer:?}: {e}")?,
            }
        }
    }
}
