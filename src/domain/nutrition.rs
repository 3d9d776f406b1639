use serde::{Deserialize, Serialize};

/// One of the eight nutrition quantities the classifier was trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nutrient {
    Calories,
    Protein,
    Fat,
    Carbohydrates,
    Sugars,
    DietaryFiber,
    Sodium,
    NutritionDensity,
}

impl Nutrient {
    /// Every nutrient, in the order the request interface takes them.
    pub const ALL: [Nutrient; 8] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::Carbohydrates,
        Nutrient::Sugars,
        Nutrient::DietaryFiber,
        Nutrient::Sodium,
        Nutrient::NutritionDensity,
    ];

    /// Column name used by the training dataset and the model schema
    pub fn column_name(&self) -> &'static str {
        match self {
            Nutrient::Calories => "Caloric Value",
            Nutrient::Protein => "Protein",
            Nutrient::Fat => "Fat",
            Nutrient::Carbohydrates => "Carbohydrates",
            Nutrient::Sugars => "Sugars",
            Nutrient::DietaryFiber => "Dietary Fiber",
            Nutrient::Sodium => "Sodium",
            Nutrient::NutritionDensity => "Nutrition Density",
        }
    }

    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.column_name() == name)
    }

    /// Form label with units
    pub fn label(&self) -> &'static str {
        match self {
            Nutrient::Calories => "Calories (kcal)",
            Nutrient::Protein => "Protein (g)",
            Nutrient::Fat => "Fat (g)",
            Nutrient::Carbohydrates => "Carbohydrates (g)",
            Nutrient::Sugars => "Sugars (g)",
            Nutrient::DietaryFiber => "Dietary Fiber (g)",
            Nutrient::Sodium => "Sodium (mg)",
            Nutrient::NutritionDensity => "Nutrition Density (dataset units)",
        }
    }
}

impl std::fmt::Display for Nutrient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column_name())
    }
}

/// Per-serving nutrition values for a single request.
///
/// Values are not range-checked: negative, zero and non-finite numbers are all
/// passed through to the model and the advice rules as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionInput {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
    pub sugars: f64,
    pub dietary_fiber: f64,
    pub sodium: f64,
    pub nutrition_density: f64,
}

impl NutritionInput {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        calories: f64,
        protein: f64,
        fat: f64,
        carbohydrates: f64,
        sugars: f64,
        dietary_fiber: f64,
        sodium: f64,
        nutrition_density: f64,
    ) -> Self {
        Self {
            calories,
            protein,
            fat,
            carbohydrates,
            sugars,
            dietary_fiber,
            sodium,
            nutrition_density,
        }
    }

    /// Build from values given in `Nutrient::ALL` order
    pub fn from_array(values: [f64; 8]) -> Self {
        let [calories, protein, fat, carbohydrates, sugars, dietary_fiber, sodium, nutrition_density] =
            values;
        Self::new(
            calories,
            protein,
            fat,
            carbohydrates,
            sugars,
            dietary_fiber,
            sodium,
            nutrition_density,
        )
    }

    pub fn to_array(&self) -> [f64; 8] {
        Nutrient::ALL.map(|n| self.get(n))
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Fat => self.fat,
            Nutrient::Carbohydrates => self.carbohydrates,
            Nutrient::Sugars => self.sugars,
            Nutrient::DietaryFiber => self.dietary_fiber,
            Nutrient::Sodium => self.sodium,
            Nutrient::NutritionDensity => self.nutrition_density,
        }
    }
}

/// Feature values ordered to match the model schema.
///
/// Only the feature assembler builds these, so `columns` always holds each
/// nutrient exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    columns: Vec<Nutrient>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub(crate) fn from_parts(columns: Vec<Nutrient>, values: Vec<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Raw values in schema order, as handed to the oracle
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn columns(&self) -> &[Nutrient] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look a value up by name rather than position
    pub fn value_of(&self, nutrient: Nutrient) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| *c == nutrient)
            .map(|idx| self.values[idx])
    }

    /// Rebuild the request input by name. `None` if a nutrient is absent.
    pub fn to_input(&self) -> Option<NutritionInput> {
        let mut values = [0.0_f64; 8];
        for (slot, nutrient) in values.iter_mut().zip(Nutrient::ALL) {
            *slot = self.value_of(nutrient)?;
        }
        Some(NutritionInput::from_array(values))
    }
}
