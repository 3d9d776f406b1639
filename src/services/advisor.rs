//! Turns a nutrition input into the user-facing prediction and advice.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{
    AdviceText, AdvisorResponse, FeatureVector, Nutrient, NutritionInput, PredictionResult,
};
use crate::error::{PlateError, PredictionError, Result};
use crate::ml::oracle::{argmax, ModelArtifact, Oracle};
use crate::services::{FeatureAssembler, Metrics};

/// Which side of the threshold triggers a tip. Both comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Above(f64),
    Below(f64),
}

impl Threshold {
    pub fn triggers(&self, value: f64) -> bool {
        match *self {
            Threshold::Above(limit) => value > limit,
            Threshold::Below(limit) => value < limit,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdviceRule {
    pub nutrient: Nutrient,
    pub threshold: Threshold,
    pub tip: &'static str,
}

/// Evaluated in this order, each against its own raw input field only.
pub const ADVICE_RULES: [AdviceRule; 4] = [
    AdviceRule {
        nutrient: Nutrient::Fat,
        threshold: Threshold::Above(80.0),
        tip: "Reduce fatty foods.",
    },
    AdviceRule {
        nutrient: Nutrient::Sugars,
        threshold: Threshold::Above(50.0),
        tip: "Lower sugar intake.",
    },
    AdviceRule {
        nutrient: Nutrient::DietaryFiber,
        threshold: Threshold::Below(20.0),
        tip: "Add more fiber (fruits/vegetables).",
    },
    AdviceRule {
        nutrient: Nutrient::Protein,
        threshold: Threshold::Below(50.0),
        tip: "Increase protein intake.",
    },
];

/// Prefix of the single-line response returned when the oracle fails
pub const PREDICTION_ERROR_PREFIX: &str = "Error in prediction:";

/// Holds the loaded model for the life of the process. Stateless per request.
pub struct Advisor {
    oracle: Arc<dyn Oracle>,
    assembler: FeatureAssembler,
    metrics: Option<Arc<Metrics>>,
}

impl Advisor {
    /// Fails with `SchemaMismatch` if the artifact's feature list is not the
    /// eight known nutrients, or the oracle expects a different row width.
    pub fn new(artifact: ModelArtifact) -> Result<Self> {
        let assembler = FeatureAssembler::new(&artifact.features)?;
        let expected = artifact.oracle.input_dim();
        if expected != assembler.order().len() {
            return Err(PlateError::SchemaMismatch {
                reason: format!(
                    "model expects {expected} inputs, schema has {}",
                    assembler.order().len()
                ),
                schema: artifact.features,
            });
        }
        Ok(Self {
            oracle: artifact.oracle,
            assembler,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn assembler(&self) -> &FeatureAssembler {
        &self.assembler
    }

    pub fn oracle(&self) -> &Arc<dyn Oracle> {
        &self.oracle
    }

    /// Label and confidence from the oracle. No retries, no fallback label.
    pub fn classify(
        &self,
        features: &FeatureVector,
    ) -> std::result::Result<PredictionResult, PredictionError> {
        let class = self.oracle.predict(features)?;
        let proba = self.oracle.predict_proba(features)?;
        // Rejects empty and non-finite rows before taking the max.
        argmax(&proba)?;
        Ok(PredictionResult::from_oracle(class, &proba))
    }

    pub fn advise(input: &NutritionInput) -> AdviceText {
        let tips = ADVICE_RULES
            .iter()
            .filter(|rule| rule.threshold.triggers(input.get(rule.nutrient)))
            .map(|rule| rule.tip)
            .collect();
        AdviceText { tips }
    }

    pub fn respond(
        &self,
        input: &NutritionInput,
    ) -> std::result::Result<AdvisorResponse, PredictionError> {
        let features = self.assembler.assemble(input);
        let prediction = self.classify(&features)?;
        let advice = Self::advise(input);
        debug!(
            "Predicted {} ({}%) with {} tip(s)",
            prediction.label,
            prediction.confidence_text(),
            advice.tips.len()
        );
        Ok(AdvisorResponse { prediction, advice })
    }

    /// Request boundary: oracle failures become the error text, never a panic
    /// or an `Err`.
    pub fn answer(&self, input: &NutritionInput) -> std::result::Result<AdvisorResponse, String> {
        match self.respond(input) {
            Ok(response) => {
                if let Some(m) = &self.metrics {
                    m.record_prediction(response.prediction.label);
                }
                Ok(response)
            }
            Err(e) => {
                warn!(kind = %e.kind, "Prediction failed: {}", e.cause);
                if let Some(m) = &self.metrics {
                    m.record_failure(e.kind);
                }
                Err(format!("{PREDICTION_ERROR_PREFIX} {e}"))
            }
        }
    }

    pub fn predict(&self, input: &NutritionInput) -> String {
        match self.answer(input) {
            Ok(response) => response.to_string(),
            Err(text) => text,
        }
    }

    /// Positional form of [`Advisor::predict`], in form-field order.
    #[allow(clippy::too_many_arguments)]
    pub fn predict_values(
        &self,
        calories: f64,
        protein: f64,
        fat: f64,
        carbs: f64,
        sugars: f64,
        fiber: f64,
        sodium: f64,
        nutrition_density: f64,
    ) -> String {
        self.predict(&NutritionInput::new(
            calories,
            protein,
            fat,
            carbs,
            sugars,
            fiber,
            sodium,
            nutrition_density,
        ))
    }
}
