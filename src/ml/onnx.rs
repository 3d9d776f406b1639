//! ONNX classifier (pure Rust via `tract-onnx`).
//!
//! Expects a graph taking a `[1, n_features]` f32 tensor whose first output is
//! the probability row, one column per class.

use std::path::Path;

use tract_onnx::prelude::*;

use crate::domain::FeatureVector;
use crate::error::{PlateError, PredictionError, Result};
use crate::ml::oracle::{argmax, Oracle};

pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
    input_dim: usize,
    classes: Vec<i64>,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("input_dim", &self.input_dim)
            .field("classes", &self.classes)
            .finish()
    }
}

impl OnnxClassifier {
    /// Load and specialize the graph to a `[1, input_dim]` input.
    pub fn load(path: &Path, input_dim: usize, classes: Vec<i64>) -> Result<Self> {
        if classes.len() < 2 {
            return Err(PlateError::ModelLoad(
                "classes must list at least 2 labels".to_string(),
            ));
        }
        if input_dim == 0 {
            return Err(PlateError::ModelLoad("input_dim must be > 0".to_string()));
        }

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| PlateError::ModelLoad(format!("onnx load failed: {e}")))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, input_dim)),
            )
            .map_err(|e| PlateError::ModelLoad(format!("onnx input fact failed: {e}")))?
            .into_optimized()
            .map_err(|e| PlateError::ModelLoad(format!("onnx optimize failed: {e}")))?
            .into_runnable()
            .map_err(|e| PlateError::ModelLoad(format!("onnx runnable failed: {e}")))?;

        let model = Self {
            plan,
            input_dim,
            classes,
        };

        // Dry run so a wrong output head fails at startup, not per request.
        let probe = model
            .run(&vec![0.0; input_dim])
            .map_err(|e| PlateError::ModelLoad(format!("onnx probe failed: {e}")))?;
        if probe.len() != model.classes.len() {
            return Err(PlateError::ModelLoad(format!(
                "onnx output has {} columns, expected {} classes",
                probe.len(),
                model.classes.len()
            )));
        }
        Ok(model)
    }

    fn run(&self, input: &[f64]) -> std::result::Result<Vec<f64>, PredictionError> {
        if input.len() != self.input_dim {
            return Err(PredictionError::shape(format!(
                "onnx input dim mismatch: got {}, expected {}",
                input.len(),
                self.input_dim
            )));
        }

        let row: Vec<f32> = input.iter().map(|v| *v as f32).collect();
        let tensor = tract_ndarray::Array2::<f32>::from_shape_vec((1, self.input_dim), row)
            .map_err(|e| PredictionError::shape(format!("onnx input reshape failed: {e}")))?
            .into_tvalue();

        let outputs = self
            .plan
            .run(tvec!(tensor))
            .map_err(|e| PredictionError::backend(format!("onnx run failed: {e}")))?;
        let first = outputs
            .first()
            .ok_or_else(|| PredictionError::backend("onnx produced no outputs"))?;
        let arr = first
            .to_array_view::<f32>()
            .map_err(|e| PredictionError::backend(format!("onnx output decode failed: {e}")))?;

        Ok(arr.iter().map(|v| *v as f64).collect())
    }
}

impl Oracle for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> std::result::Result<i64, PredictionError> {
        let proba = self.predict_proba(features)?;
        Ok(self.classes[argmax(&proba)?])
    }

    fn predict_proba(
        &self,
        features: &FeatureVector,
    ) -> std::result::Result<Vec<f64>, PredictionError> {
        let proba = self.run(features.values())?;
        if proba.len() != self.classes.len() {
            return Err(PredictionError::shape(format!(
                "onnx output has {} columns, expected {}",
                proba.len(),
                self.classes.len()
            )));
        }
        if proba.iter().any(|p| !p.is_finite()) {
            return Err(PredictionError::numeric(format!(
                "onnx produced non-finite probabilities {proba:?}"
            )));
        }
        Ok(proba)
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn describe(&self) -> String {
        format!("onnx(input={}, classes={:?})", self.input_dim, self.classes)
    }
}
