//! Output of a single prediction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary risk class. The model's raw class `1` is [`RiskLabel::Pathogenic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    Benign,
    Pathogenic,
}

impl RiskLabel {
    /// Map a raw classifier output. Anything other than 0 or 1 is `None`.
    pub fn from_class(class: i64) -> Option<Self> {
        match class {
            0 => Some(Self::Benign),
            1 => Some(Self::Pathogenic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Benign => "Benign",
            Self::Pathogenic => "Pathogenic",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One label and the probability the model assigns to the Pathogenic class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: RiskLabel,
    pub probability: f64,
}

impl PredictionResult {
    /// Probability rounded to three decimals, as shown to the user.
    pub fn risk_score(&self) -> f64 {
        (self.probability * 1000.0).round() / 1000.0
    }

    pub fn is_pathogenic(&self) -> bool {
        self.label == RiskLabel::Pathogenic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_from_raw_class() {
        assert_eq!(RiskLabel::from_class(0), Some(RiskLabel::Benign));
        assert_eq!(RiskLabel::from_class(1), Some(RiskLabel::Pathogenic));
        assert_eq!(RiskLabel::from_class(2), None);
        assert_eq!(RiskLabel::from_class(-1), None);
    }

    #[test]
    fn risk_score_rounds_to_three_places() {
        let r = PredictionResult {
            label: RiskLabel::Pathogenic,
            probability: 0.87654,
        };
        assert_eq!(r.risk_score(), 0.877);
        assert!(r.is_pathogenic());

        let r = PredictionResult {
            label: RiskLabel::Benign,
            probability: 0.0004,
        };
        assert_eq!(r.risk_score(), 0.0);
    }

    #[test]
    fn serializes_label_as_name() {
        let r = PredictionResult {
            label: RiskLabel::Benign,
            probability: 0.25,
        };
        let json = serde_json::to_value(r).unwrap();
        assert_eq!(json["label"], "Benign");
        assert_eq!(json["probability"], 0.25);
    }
}
