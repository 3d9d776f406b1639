use thiserror::Error;

/// Main error type for the nutrition advisor
#[derive(Error, Debug)]
pub enum PlateError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Model artifact errors
    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Schema mismatch: {reason} (schema={schema:?})")]
    SchemaMismatch { reason: String, schema: Vec<String> },

    // Per-request oracle failures
    #[error(transparent)]
    Prediction(#[from] PredictionError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for PlateError
pub type Result<T> = std::result::Result<T, PlateError>;

/// Why the oracle could not produce a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionFailure {
    /// Input or output dimensions disagree with the model (a wiring bug).
    Shape,
    /// The model ran but produced unusable numbers (NaN, inf, empty output).
    Numeric,
    /// The inference engine itself failed.
    Backend,
}

impl PredictionFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionFailure::Shape => "shape",
            PredictionFailure::Numeric => "numeric",
            PredictionFailure::Backend => "backend",
        }
    }
}

impl std::fmt::Display for PredictionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Oracle invocation failure. Displays as the bare cause so it can be shown
/// to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{cause}")]
pub struct PredictionError {
    pub kind: PredictionFailure,
    pub cause: String,
}

impl PredictionError {
    pub fn new(kind: PredictionFailure, cause: impl Into<String>) -> Self {
        Self {
            kind,
            cause: cause.into(),
        }
    }

    pub fn shape(cause: impl Into<String>) -> Self {
        Self::new(PredictionFailure::Shape, cause)
    }

    pub fn numeric(cause: impl Into<String>) -> Self {
        Self::new(PredictionFailure::Numeric, cause)
    }

    pub fn backend(cause: impl Into<String>) -> Self {
        Self::new(PredictionFailure::Backend, cause)
    }
}
