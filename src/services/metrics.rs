use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::PlateLabel;
use crate::error::PredictionFailure;

/// Request counters for observability. Lock-free; shared by every handler.
pub struct Metrics {
    /// Requests answered with a prediction
    pub predictions: AtomicU64,
    /// Requests answered with "Error in prediction"
    pub prediction_errors: AtomicU64,
    pub balanced: AtomicU64,
    pub unbalanced: AtomicU64,
    pub unknown: AtomicU64,
    /// Oracle failures by kind
    pub shape_errors: AtomicU64,
    pub numeric_errors: AtomicU64,
    pub backend_errors: AtomicU64,
    started_at: DateTime<Utc>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            predictions: AtomicU64::new(0),
            prediction_errors: AtomicU64::new(0),
            balanced: AtomicU64::new(0),
            unbalanced: AtomicU64::new(0),
            unknown: AtomicU64::new(0),
            shape_errors: AtomicU64::new(0),
            numeric_errors: AtomicU64::new(0),
            backend_errors: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    pub fn record_prediction(&self, label: PlateLabel) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        let counter = match label {
            PlateLabel::Balanced => &self.balanced,
            PlateLabel::Unbalanced => &self.unbalanced,
            PlateLabel::Unknown => &self.unknown,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, kind: PredictionFailure) {
        self.prediction_errors.fetch_add(1, Ordering::Relaxed);
        let counter = match kind {
            PredictionFailure::Shape => &self.shape_errors,
            PredictionFailure::Numeric => &self.numeric_errors,
            PredictionFailure::Backend => &self.backend_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.started_at).num_seconds().max(0) as u64
    }

    /// Export metrics in Prometheus format
    pub fn prometheus(&self) -> String {
        format!(
            r#"# HELP plate_uptime_seconds Uptime in seconds
# TYPE plate_uptime_seconds counter
plate_uptime_seconds {}

# HELP plate_predictions_total Requests answered with a prediction
# TYPE plate_predictions_total counter
plate_predictions_total {}

# HELP plate_predictions_by_label_total Predictions per label
# TYPE plate_predictions_by_label_total counter
plate_predictions_by_label_total{{label="balanced"}} {}
plate_predictions_by_label_total{{label="unbalanced"}} {}
plate_predictions_by_label_total{{label="unknown"}} {}

# HELP plate_prediction_errors_total Oracle failures returned to the caller
# TYPE plate_prediction_errors_total counter
plate_prediction_errors_total {}

# HELP plate_prediction_errors_by_kind_total Oracle failures per kind
# TYPE plate_prediction_errors_by_kind_total counter
plate_prediction_errors_by_kind_total{{kind="shape"}} {}
plate_prediction_errors_by_kind_total{{kind="numeric"}} {}
plate_prediction_errors_by_kind_total{{kind="backend"}} {}
"#,
            self.uptime_seconds(),
            self.predictions.load(Ordering::Relaxed),
            self.balanced.load(Ordering::Relaxed),
            self.unbalanced.load(Ordering::Relaxed),
            self.unknown.load(Ordering::Relaxed),
            self.prediction_errors.load(Ordering::Relaxed),
            self.shape_errors.load(Ordering::Relaxed),
            self.numeric_errors.load(Ordering::Relaxed),
            self.backend_errors.load(Ordering::Relaxed),
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
