use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::NutritionInput;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub form: FormConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Path to the model artifact JSON (pipeline + feature order)
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily-rotated log files
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Prefilled form values and example inputs offered to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default = "default_form_values")]
    pub defaults: NutritionInput,
    #[serde(default = "default_examples")]
    pub examples: Vec<NutritionInput>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            defaults: default_form_values(),
            examples: default_examples(),
        }
    }
}

fn default_form_values() -> NutritionInput {
    NutritionInput::new(200.0, 20.0, 15.0, 40.0, 10.0, 5.0, 300.0, 50.0)
}

fn default_examples() -> Vec<NutritionInput> {
    vec![
        NutritionInput::new(500.0, 30.0, 10.0, 50.0, 8.0, 6.0, 400.0, 60.0),
        NutritionInput::new(900.0, 10.0, 70.0, 100.0, 45.0, 5.0, 900.0, 30.0),
    ]
}

impl AppConfig {
    /// Load configuration from a specific directory and the process environment
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        Self::load_with_env(config_dir, Self::environment())
    }

    /// `PLATE_SERVER__PORT=9000` sets `server.port`: one `_` after the
    /// prefix, `__` between nested keys.
    fn environment() -> Environment {
        Environment::with_prefix("PLATE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with_env<P: AsRef<Path>>(config_dir: P, env: Environment) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("model.path", "healthy_plate_model.json")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 7860)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("PLATE_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (PLATE_MODEL__PATH, etc.)
            .add_source(env);

        builder.build()?.try_deserialize()
    }

    /// Configuration used when no files or environment are present
    pub fn default_config(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model: ModelConfig {
                path: model_path.into(),
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 7860,
            },
            logging: LoggingConfig::default(),
            form: FormConfig::default(),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.model.path.as_os_str().is_empty() {
            errors.push("model.path must not be empty".to_string());
        }

        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }

        match self.logging.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => errors.push(format!("invalid logging.level: {other}")),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
