//! Healthy Plate: a nutrition advisor around a pre-trained plate classifier.
//!
//! Eight nutrition values are reordered into the model's training schema,
//! classified as Balanced/Unbalanced, and paired with threshold-based tips.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ml;
pub mod services;

pub use config::AppConfig;
pub use domain::{
    AdviceText, AdvisorResponse, FeatureVector, Nutrient, NutritionInput, PlateLabel,
    PredictionResult,
};
pub use error::{PlateError, PredictionError, PredictionFailure, Result};
pub use ml::{ModelArtifact, Oracle};
pub use services::{Advisor, FeatureAssembler, Metrics};
