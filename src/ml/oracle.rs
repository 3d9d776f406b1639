//! Trained classifier seam and the on-disk model artifact.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::domain::FeatureVector;
use crate::error::{PlateError, PredictionError, Result};
use crate::ml::DenseClassifier;

/// Opaque pre-trained classifier.
///
/// Implementations are read-only after load and shared across requests.
#[cfg_attr(test, mockall::automock)]
pub trait Oracle: Send + Sync {
    /// Predicted class value.
    fn predict(&self, features: &FeatureVector) -> std::result::Result<i64, PredictionError>;

    /// Probability per class, in `classes()` order.
    fn predict_proba(
        &self,
        features: &FeatureVector,
    ) -> std::result::Result<Vec<f64>, PredictionError>;

    /// Class values the model was trained on.
    fn classes(&self) -> &[i64];

    /// Number of features the model expects per row.
    fn input_dim(&self) -> usize;

    /// Short human-readable description for logs and `/api/schema`.
    fn describe(&self) -> String;
}

/// Index of the largest probability. Fails on empty or non-finite rows.
pub fn argmax(proba: &[f64]) -> std::result::Result<usize, PredictionError> {
    if proba.is_empty() {
        return Err(PredictionError::numeric("model produced no probabilities"));
    }
    if proba.iter().any(|p| !p.is_finite()) {
        return Err(PredictionError::numeric(format!(
            "model produced non-finite probabilities {proba:?}"
        )));
    }
    let mut best = 0;
    for (idx, p) in proba.iter().enumerate() {
        if *p > proba[best] {
            best = idx;
        }
    }
    Ok(best)
}

/// Pipeline section of the artifact file
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineSpec {
    Dense(DenseClassifier),
    /// ONNX graph on disk; `path` is relative to the artifact file.
    Onnx {
        path: PathBuf,
        #[serde(default = "default_onnx_classes")]
        classes: Vec<i64>,
    },
}

fn default_onnx_classes() -> Vec<i64> {
    vec![0, 1]
}

#[derive(Debug, Deserialize)]
struct ArtifactFile {
    pipeline: PipelineSpec,
    features: Vec<String>,
}

/// A loaded model: the oracle plus the feature order it was trained with.
#[derive(Clone)]
pub struct ModelArtifact {
    pub oracle: Arc<dyn Oracle>,
    pub features: Vec<String>,
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("oracle", &self.oracle.describe())
            .field("features", &self.features)
            .finish()
    }
}

impl ModelArtifact {
    pub fn new(oracle: Arc<dyn Oracle>, features: Vec<String>) -> Self {
        Self { oracle, features }
    }

    /// Load the artifact JSON. Any failure here is fatal for the process.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlateError::ModelLoad(format!("cannot read {}: {e}", path.display()))
        })?;
        let file: ArtifactFile = serde_json::from_str(&content).map_err(|e| {
            PlateError::ModelLoad(format!("malformed artifact {}: {e}", path.display()))
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let oracle = build_oracle(file.pipeline, base, file.features.len())?;
        if oracle.input_dim() != file.features.len() {
            return Err(PlateError::ModelLoad(format!(
                "{} expects {} inputs but lists {} features",
                path.display(),
                oracle.input_dim(),
                file.features.len()
            )));
        }
        info!(
            "Loaded model {} from {} ({} features)",
            oracle.describe(),
            path.display(),
            file.features.len()
        );

        Ok(Self {
            oracle,
            features: file.features,
        })
    }
}

fn build_oracle(spec: PipelineSpec, base: &Path, input_dim: usize) -> Result<Arc<dyn Oracle>> {
    match spec {
        PipelineSpec::Dense(model) => {
            model.validate()?;
            Ok(Arc::new(model))
        }
        PipelineSpec::Onnx { path, classes } => build_onnx(base.join(path), input_dim, classes),
    }
}

#[cfg(feature = "onnx")]
fn build_onnx(path: PathBuf, input_dim: usize, classes: Vec<i64>) -> Result<Arc<dyn Oracle>> {
    let model = crate::ml::OnnxClassifier::load(&path, input_dim, classes)?;
    Ok(Arc::new(model))
}

#[cfg(not(feature = "onnx"))]
fn build_onnx(path: PathBuf, _input_dim: usize, _classes: Vec<i64>) -> Result<Arc<dyn Oracle>> {
    Err(PlateError::ModelLoad(format!(
        "{} is an ONNX pipeline; rebuild with `--features onnx`",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_artifact(name: &str, body: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "healthy-plate-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("model.json");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]).unwrap(), 0);
        assert_eq!(argmax(&[0.2, 0.7, 0.1]).unwrap(), 1);
    }

    #[test]
    fn argmax_rejects_bad_rows() {
        assert!(argmax(&[]).is_err());
        assert!(argmax(&[0.5, f64::NAN]).is_err());
    }

    #[test]
    fn loads_dense_artifact() {
        let path = write_artifact(
            "dense",
            r#"{
                "features": ["Caloric Value","Protein","Fat","Carbohydrates",
                             "Sugars","Dietary Fiber","Sodium","Nutrition Density"],
                "pipeline": {
                    "kind": "dense",
                    "input_dim": 8,
                    "layers": [{"weights": [[0,0,0,0,0,0,0,0]], "bias": [0], "activation": "sigmoid"}]
                }
            }"#,
        );
        let artifact = ModelArtifact::load(&path).unwrap();
        assert_eq!(artifact.features.len(), 8);
        assert_eq!(artifact.oracle.classes(), &[0, 1]);
    }

    #[test]
    fn missing_artifact_is_a_load_error() {
        let err = ModelArtifact::load("/nonexistent/healthy_plate.json").unwrap_err();
        assert!(matches!(err, PlateError::ModelLoad(_)));
    }

    #[test]
    fn malformed_artifact_is_a_load_error() {
        let path = write_artifact("malformed", r#"{"features": [], "pipeline": {"kind": "forest"}}"#);
        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(matches!(err, PlateError::ModelLoad(_)));
    }

    #[test]
    fn invalid_dense_shapes_are_rejected_at_load() {
        let path = write_artifact(
            "shapes",
            r#"{
                "features": ["Fat"],
                "pipeline": {"kind": "dense", "input_dim": 2,
                             "layers": [{"weights": [[1]], "bias": [0]}]}
            }"#,
        );
        assert!(ModelArtifact::load(&path).is_err());
    }

    #[test]
    fn input_dim_must_match_feature_count() {
        let path = write_artifact(
            "short-head",
            r#"{
                "features": ["Caloric Value","Protein","Fat","Carbohydrates",
                             "Sugars","Dietary Fiber","Sodium","Nutrition Density"],
                "pipeline": {
                    "kind": "dense",
                    "input_dim": 5,
                    "layers": [{"weights": [[0,0,0,0,0]], "bias": [0], "activation": "sigmoid"}]
                }
            }"#,
        );
        match ModelArtifact::load(&path) {
            Err(PlateError::ModelLoad(msg)) => {
                assert!(msg.contains("expects 5 inputs but lists 8 features"), "{msg}")
            }
            other => panic!("expected load error, got {other:?}"),
        }
    }
}
