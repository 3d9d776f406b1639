use std::collections::HashSet;

use crate::domain::{FeatureVector, Nutrient, NutritionInput};
use crate::error::{PlateError, Result};

/// Reorders request inputs into the column order the model was trained on.
///
/// Built once at startup from the artifact schema; the schema check happens
/// here so a wrong order can never reach the oracle.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    order: Vec<Nutrient>,
}

impl FeatureAssembler {
    pub fn new(schema: &[String]) -> Result<Self> {
        let mismatch = |reason: String| PlateError::SchemaMismatch {
            reason,
            schema: schema.to_vec(),
        };

        if schema.len() != Nutrient::ALL.len() {
            return Err(mismatch(format!(
                "expected {} features, got {}",
                Nutrient::ALL.len(),
                schema.len()
            )));
        }

        let mut order = Vec::with_capacity(schema.len());
        let mut seen = HashSet::new();
        for name in schema {
            let nutrient = Nutrient::from_column_name(name)
                .ok_or_else(|| mismatch(format!("unknown feature `{name}`")))?;
            if !seen.insert(nutrient) {
                return Err(mismatch(format!("duplicate feature `{name}`")));
            }
            order.push(nutrient);
        }

        Ok(Self { order })
    }

    /// Schema order the assembler emits
    pub fn order(&self) -> &[Nutrient] {
        &self.order
    }

    pub fn assemble(&self, input: &NutritionInput) -> FeatureVector {
        let values = self.order.iter().map(|n| input.get(*n)).collect();
        FeatureVector::from_parts(self.order.clone(), values)
    }
}
