//! HTTP front end for the advisor.
//!
//! JSON and plain-text prediction endpoints, form presets, and the usual
//! liveness/readiness probes plus a Prometheus metrics endpoint.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::FormConfig;
use crate::domain::{Nutrient, NutritionInput, PlateLabel};
use crate::error::{PlateError, Result};
use crate::services::{Advisor, Metrics};

/// Shared state for all handlers. Everything in here is read-only except the
/// atomic counters in `metrics`.
#[derive(Clone)]
pub struct AppState {
    pub advisor: Arc<Advisor>,
    pub metrics: Arc<Metrics>,
    pub form: Arc<FormConfig>,
}

impl AppState {
    pub fn new(advisor: Arc<Advisor>, metrics: Arc<Metrics>, form: FormConfig) -> Self {
        Self {
            advisor,
            metrics,
            form: Arc::new(form),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub ok: bool,
    /// Exactly what the text endpoint returns
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<PlateLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub model: String,
    pub classes: Vec<i64>,
    pub features: Vec<FieldInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub model: String,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/predict", post(predict_handler))
        .route("/api/predict/text", post(predict_text_handler))
        .route("/api/presets", get(presets_handler))
        .route("/api/schema", get(schema_handler))
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(cors)
}

/// Advisor HTTP server
pub struct PlateServer {
    state: AppState,
    addr: String,
}

impl PlateServer {
    pub fn new(state: AppState, addr: impl Into<String>) -> Self {
        Self {
            state,
            addr: addr.into(),
        }
    }

    /// Serve until the process receives Ctrl-C
    pub async fn run(&self) -> Result<()> {
        let app = create_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!("Starting advisor server on {}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| PlateError::Internal(format!("Advisor server error: {}", e)))?;

        info!("Advisor server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// POST /api/predict
async fn predict_handler(
    State(state): State<AppState>,
    Json(input): Json<NutritionInput>,
) -> Json<PredictResponse> {
    let response = match state.advisor.answer(&input) {
        Ok(r) => PredictResponse {
            ok: true,
            text: r.to_string(),
            label: Some(r.prediction.label),
            confidence: Some(r.prediction.confidence),
            advice: Some(r.advice.to_string()),
            tips: r.advice.tips.iter().map(|t| t.to_string()).collect(),
        },
        Err(text) => PredictResponse {
            ok: false,
            text,
            label: None,
            confidence: None,
            advice: None,
            tips: Vec::new(),
        },
    };
    Json(response)
}

/// POST /api/predict/text
async fn predict_text_handler(
    State(state): State<AppState>,
    Json(input): Json<NutritionInput>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.advisor.predict(&input),
    )
}

/// GET /api/presets
async fn presets_handler(State(state): State<AppState>) -> Json<FormConfig> {
    Json(state.form.as_ref().clone())
}

/// GET /api/schema
async fn schema_handler(State(state): State<AppState>) -> Json<SchemaResponse> {
    let features = state
        .advisor
        .assembler()
        .order()
        .iter()
        .map(|n: &Nutrient| FieldInfo {
            name: n.column_name().to_string(),
            label: n.label().to_string(),
        })
        .collect();
    Json(SchemaResponse {
        model: state.advisor.oracle().describe(),
        classes: state.advisor.oracle().classes().to_vec(),
        features,
    })
}

/// Full health check endpoint
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    // The model is loaded before the router exists, so a running server is healthy.
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        started_at: state.metrics.started_at(),
        uptime_seconds: state.metrics.uptime_seconds(),
        model: state.advisor.oracle().describe(),
    })
}

/// Kubernetes liveness probe - is the process alive?
async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Kubernetes readiness probe - is the service ready to handle traffic?
async fn readiness_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// Prometheus metrics endpoint
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.metrics.prometheus(),
    )
}
