use serde::{Deserialize, Serialize};

/// Label predicted for a plate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlateLabel {
    Balanced,
    Unbalanced,
    /// The model emitted a class outside the trained label set
    Unknown,
}

impl PlateLabel {
    /// Map a raw model class to a label. Only 1 and 0 are meaningful.
    pub fn from_class(class: i64) -> Self {
        match class {
            1 => PlateLabel::Balanced,
            0 => PlateLabel::Unbalanced,
            _ => PlateLabel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlateLabel::Balanced => "Balanced",
            PlateLabel::Unbalanced => "Unbalanced",
            PlateLabel::Unknown => "?",
        }
    }
}

impl std::fmt::Display for PlateLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifier output for one request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: PlateLabel,
    /// Highest class probability as a percentage, rounded to 2 decimals
    pub confidence: f64,
}

impl PredictionResult {
    /// `probabilities` must be non-empty and finite.
    pub fn from_oracle(class: i64, probabilities: &[f64]) -> Self {
        let max = probabilities
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        Self {
            label: PlateLabel::from_class(class),
            confidence: round_to(max * 100.0, 2),
        }
    }

    /// Percentage text: shortest round-trip decimal, at least one fractional digit.
    pub fn confidence_text(&self) -> String {
        let text = self.confidence.to_string();
        if self.confidence.is_finite() && !text.contains('.') && !text.contains('e') {
            format!("{text}.0")
        } else {
            text
        }
    }
}

/// Halves go to the even neighbour, so `50.125` becomes `50.12`.
fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10_f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Tips triggered by the advice rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdviceText {
    pub tips: Vec<&'static str>,
}

impl AdviceText {
    pub const BALANCED: &'static str = "Your input looks generally balanced. Keep it up!";

    pub fn is_balanced(&self) -> bool {
        self.tips.is_empty()
    }
}

impl std::fmt::Display for AdviceText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.tips.is_empty() {
            f.write_str(Self::BALANCED)
        } else {
            f.write_str(&self.tips.join(" "))
        }
    }
}

/// Complete answer for a request: classification plus advice.
///
/// Displays as exactly two lines.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorResponse {
    pub prediction: PredictionResult,
    pub advice: AdviceText,
}

impl std::fmt::Display for AdvisorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Prediction: {} (Confidence: {}%)\nAdvice: {}",
            self.prediction.label,
            self.prediction.confidence_text(),
            self.advice
        )
    }
}
