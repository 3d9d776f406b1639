use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::FormConfig;
use crate::domain::{Nutrient, NutritionInput};
use crate::error::Result;
use crate::ml::ModelArtifact;
use crate::services::{Advisor, FeatureAssembler};

#[derive(Parser)]
#[command(name = "healthy-plate")]
#[command(author = "Healthy Plate Team")]
#[command(version = "0.1.0")]
#[command(
    about = "Healthy Plate - a simple nutrition advisor",
    long_about = "Enter approximate nutritional values (per serving) and get a quick \
                  Balanced/Unbalanced prediction, a confidence score, and short advice.\n\
                  Note: labels are heuristic and for demo purposes only."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory
    #[arg(short, long, default_value = "config")]
    pub config: PathBuf,

    /// Model artifact path (overrides model.path)
    #[arg(short, long)]
    pub model: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the advisor over HTTP (default)
    Serve {
        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Predict a single plate and print the advice
    Predict(PlateArgs),
    /// Run the built-in example plates
    Examples,
    /// Show the model's feature schema
    Schema,
}

/// Nutrition values per serving. Defaults are the form's prefilled values.
#[derive(Args, Debug, Clone)]
pub struct PlateArgs {
    /// Calories (kcal)
    #[arg(long, default_value_t = 200.0, allow_hyphen_values = true)]
    pub calories: f64,
    /// Protein (g)
    #[arg(long, default_value_t = 20.0, allow_hyphen_values = true)]
    pub protein: f64,
    /// Fat (g)
    #[arg(long, default_value_t = 15.0, allow_hyphen_values = true)]
    pub fat: f64,
    /// Carbohydrates (g)
    #[arg(long, default_value_t = 40.0, allow_hyphen_values = true)]
    pub carbs: f64,
    /// Sugars (g)
    #[arg(long, default_value_t = 10.0, allow_hyphen_values = true)]
    pub sugars: f64,
    /// Dietary Fiber (g)
    #[arg(long, default_value_t = 5.0, allow_hyphen_values = true)]
    pub fiber: f64,
    /// Sodium (mg)
    #[arg(long, default_value_t = 300.0, allow_hyphen_values = true)]
    pub sodium: f64,
    /// Nutrition Density (dataset units)
    #[arg(long, default_value_t = 50.0, allow_hyphen_values = true)]
    pub nutrition_density: f64,
}

impl PlateArgs {
    pub fn to_input(&self) -> NutritionInput {
        NutritionInput::new(
            self.calories,
            self.protein,
            self.fat,
            self.carbs,
            self.sugars,
            self.fiber,
            self.sodium,
            self.nutrition_density,
        )
    }
}

/// Predict one plate and print the two-line answer
pub fn predict_once(advisor: &Advisor, args: &PlateArgs) {
    println!("{}", advisor.predict(&args.to_input()));
}

/// Run every configured example plate
pub fn run_examples(advisor: &Advisor, form: &FormConfig) {
    for (idx, input) in form.examples.iter().enumerate() {
        println!("Example {}:", idx + 1);
        for nutrient in Nutrient::ALL {
            println!("  {:<36} {}", nutrient.label(), input.get(nutrient));
        }
        println!("{}\n", advisor.predict(input));
    }
}

/// Print the artifact's feature order and whether it matches the known fields
pub fn show_schema(artifact: &ModelArtifact) -> Result<()> {
    println!("Model: {}", artifact.oracle.describe());
    println!("Classes: {:?}", artifact.oracle.classes());
    println!("Features (training order):");
    for (idx, name) in artifact.features.iter().enumerate() {
        let known = if Nutrient::from_column_name(name).is_some() {
            "\x1b[32mok\x1b[0m"
        } else {
            "\x1b[31munknown\x1b[0m"
        };
        println!("  {idx}: {name} [{known}]");
    }

    match FeatureAssembler::new(&artifact.features) {
        Ok(_) => println!("\n\x1b[32m✓ Schema matches\x1b[0m"),
        Err(e) => {
            println!("\n\x1b[31m✗ {e}\x1b[0m");
            return Err(e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_defaults_match_form_defaults() {
        let cli = Cli::parse_from(["healthy-plate", "predict"]);
        let Some(Commands::Predict(args)) = cli.command else {
            panic!("expected predict command");
        };
        assert_eq!(args.to_input(), FormConfig::default().defaults);
    }

    #[test]
    fn predict_accepts_negative_values() {
        let cli = Cli::parse_from(["healthy-plate", "predict", "--fat", "-3.5", "--fiber", "0"]);
        let Some(Commands::Predict(args)) = cli.command else {
            panic!("expected predict command");
        };
        assert_eq!(args.fat, -3.5);
        assert_eq!(args.fiber, 0.0);
    }

    #[test]
    fn serve_is_optional() {
        let cli = Cli::parse_from(["healthy-plate", "--model", "m.json"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.model, Some(PathBuf::from("m.json")));
    }
}
