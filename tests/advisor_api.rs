use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use healthy_plate::{
    config::FormConfig,
    ml::{ModelArtifact, Oracle},
    FeatureVector, PredictionError,
    services::{create_router, Advisor, AppState, Metrics, PredictResponse, SchemaResponse},
};
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc};
use tower::ServiceExt;

fn demo_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/healthy_plate_model.json")
}

fn test_router() -> (Router, Arc<Metrics>) {
    let artifact = ModelArtifact::load(demo_model_path()).expect("demo model should load");
    let metrics = Arc::new(Metrics::new());
    let advisor = Advisor::new(artifact)
        .expect("demo schema should match")
        .with_metrics(metrics.clone());
    let state = AppState::new(Arc::new(advisor), metrics.clone(), FormConfig::default());
    (create_router(state), metrics)
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .oneshot(builder.body(body).expect("request should build"))
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, bytes.to_vec())
}

fn plate(values: [f64; 8]) -> Value {
    json!({
        "calories": values[0],
        "protein": values[1],
        "fat": values[2],
        "carbohydrates": values[3],
        "sugars": values[4],
        "dietary_fiber": values[5],
        "sodium": values[6],
        "nutrition_density": values[7],
    })
}

#[tokio::test]
async fn predict_returns_label_confidence_and_advice() {
    let (app, metrics) = test_router();
    let (status, body) = send(
        app,
        Method::POST,
        "/api/predict",
        Some(plate([900.0, 10.0, 70.0, 100.0, 45.0, 5.0, 900.0, 30.0])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let resp: PredictResponse = serde_json::from_slice(&body).unwrap();
    assert!(resp.ok);
    assert_eq!(
        resp.advice.as_deref(),
        Some("Add more fiber (fruits/vegetables). Increase protein intake.")
    );
    assert_eq!(resp.tips.len(), 2);

    assert_eq!(resp.confidence, Some(99.99));

    let lines: Vec<&str> = resp.text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Prediction: Unbalanced (Confidence: 99.99%)");
    assert_eq!(
        lines[1],
        "Advice: Add more fiber (fruits/vegetables). Increase protein intake."
    );

    assert_eq!(
        metrics
            .predictions
            .load(std::sync::atomic::Ordering::Relaxed),
        1
    );
}

#[tokio::test]
async fn text_endpoint_matches_json_text() {
    let (app, _) = test_router();
    let input = plate([500.0, 30.0, 10.0, 50.0, 8.0, 6.0, 400.0, 60.0]);

    let (_, json_body) = send(app.clone(), Method::POST, "/api/predict", Some(input.clone())).await;
    let (status, text_body) = send(app, Method::POST, "/api/predict/text", Some(input)).await;

    assert_eq!(status, StatusCode::OK);
    let resp: PredictResponse = serde_json::from_slice(&json_body).unwrap();
    assert_eq!(String::from_utf8(text_body).unwrap(), resp.text);
    assert!(resp.text.starts_with("Prediction: Balanced"));
}

/// Oracle whose backend always fails, standing in for a broken model engine.
struct BrokenOracle;

impl Oracle for BrokenOracle {
    fn predict(&self, _features: &FeatureVector) -> Result<i64, PredictionError> {
        Err(PredictionError::backend("session poisoned"))
    }

    fn predict_proba(&self, _features: &FeatureVector) -> Result<Vec<f64>, PredictionError> {
        Err(PredictionError::backend("session poisoned"))
    }

    fn classes(&self) -> &[i64] {
        &[0, 1]
    }

    fn input_dim(&self) -> usize {
        8
    }

    fn describe(&self) -> String {
        "broken".to_string()
    }
}

#[tokio::test]
async fn oracle_failure_is_reported_not_raised() {
    let features = ModelArtifact::load(demo_model_path()).unwrap().features;
    let metrics = Arc::new(Metrics::new());
    let advisor = Advisor::new(ModelArtifact::new(Arc::new(BrokenOracle), features))
        .unwrap()
        .with_metrics(metrics.clone());
    let app = create_router(AppState::new(
        Arc::new(advisor),
        metrics.clone(),
        FormConfig::default(),
    ));

    let input = plate([200.0, 20.0, 15.0, 40.0, 10.0, 5.0, 300.0, 50.0]);
    let (status, body) = send(app.clone(), Method::POST, "/api/predict", Some(input.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let resp: PredictResponse = serde_json::from_slice(&body).unwrap();
    assert!(!resp.ok);
    assert_eq!(resp.text, "Error in prediction: session poisoned");
    assert!(resp.label.is_none());

    // The server keeps answering after a failure.
    let (status, body) = send(app, Method::POST, "/api/predict/text", Some(input)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "Error in prediction: session poisoned"
    );
    assert_eq!(
        metrics
            .prediction_errors
            .load(std::sync::atomic::Ordering::Relaxed),
        2
    );
}

#[tokio::test]
async fn missing_field_is_rejected_by_extractor() {
    let (app, _) = test_router();
    let (status, _) = send(
        app,
        Method::POST,
        "/api/predict",
        Some(json!({"calories": 200, "protein": 20})),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn presets_expose_form_defaults_and_examples() {
    let (app, _) = test_router();
    let (status, body) = send(app, Method::GET, "/api/presets", None).await;
    assert_eq!(status, StatusCode::OK);

    let presets: FormConfig = serde_json::from_slice(&body).unwrap();
    assert_eq!(presets.defaults.sodium, 300.0);
    assert_eq!(presets.examples.len(), 2);
    assert_eq!(presets.examples[0].calories, 500.0);
}

#[tokio::test]
async fn schema_lists_features_in_training_order() {
    let (app, _) = test_router();
    let (status, body) = send(app, Method::GET, "/api/schema", None).await;
    assert_eq!(status, StatusCode::OK);

    let schema: SchemaResponse = serde_json::from_slice(&body).unwrap();
    let names: Vec<&str> = schema.features.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Caloric Value",
            "Protein",
            "Fat",
            "Carbohydrates",
            "Sugars",
            "Dietary Fiber",
            "Sodium",
            "Nutrition Density",
        ]
    );
    assert_eq!(schema.classes, vec![0, 1]);
}

#[tokio::test]
async fn probes_and_metrics_respond() {
    let (app, _) = test_router();
    for uri in ["/healthz", "/readyz", "/health"] {
        let (status, _) = send(app.clone(), Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }

    let (status, body) = send(app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("plate_predictions_total 0"));
}
