//! Dense feed-forward classifier (CPU-only).
//!
//! Small MLPs (or plain logistic regression, a single sigmoid layer) exported
//! from training as JSON. The output head is turned into a probability row:
//! - one sigmoid unit → `[1 - p, p]` for `classes = [neg, pos]`
//! - `k` units → softmax over the row (kept as-is when already softmax)

use serde::{Deserialize, Serialize};

use crate::domain::FeatureVector;
use crate::error::{PlateError, PredictionError, Result};
use crate::ml::oracle::{argmax, Oracle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Tanh,
    Sigmoid,
    Softmax,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weights shape: [out_dim][in_dim]
    pub weights: Vec<Vec<f64>>,
    /// Bias shape: [out_dim]
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn in_dim(&self) -> usize {
        self.weights.first().map(|r| r.len()).unwrap_or(0)
    }

    fn out_dim(&self) -> usize {
        self.weights.len()
    }

    fn apply(&self, x: &[f64]) -> Vec<f64> {
        let mut y: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| b + row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>())
            .collect();

        match self.activation {
            Activation::Softmax => softmax_in_place(&mut y),
            act => y.iter_mut().for_each(|v| *v = apply_activation(*v, act)),
        }
        y
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseClassifier {
    /// Expected input dimension.
    pub input_dim: usize,

    /// Optional z-score normalization (the training pipeline's scaler).
    #[serde(default)]
    pub input_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub input_std: Option<Vec<f64>>,

    pub layers: Vec<DenseLayer>,

    /// Class values, one per probability column.
    #[serde(default = "default_classes")]
    pub classes: Vec<i64>,

    /// Optional free-form metadata (versioning, training info, etc).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

fn default_classes() -> Vec<i64> {
    vec![0, 1]
}

impl DenseClassifier {
    pub fn validate(&self) -> Result<()> {
        self.check().map_err(PlateError::ModelLoad)
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.input_dim == 0 {
            return Err("input_dim must be > 0".to_string());
        }
        if self.layers.is_empty() {
            return Err("layers must not be empty".to_string());
        }
        match (&self.input_mean, &self.input_std) {
            (Some(mean), Some(std)) => {
                if mean.len() != self.input_dim {
                    return Err(format!(
                        "input_mean length {} != input_dim {}",
                        mean.len(),
                        self.input_dim
                    ));
                }
                if std.len() != self.input_dim {
                    return Err(format!(
                        "input_std length {} != input_dim {}",
                        std.len(),
                        self.input_dim
                    ));
                }
                if std.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                    return Err("input_std must be finite and > 0".to_string());
                }
            }
            (None, None) => {}
            _ => return Err("input_mean and input_std must be provided together".to_string()),
        }

        let mut expected_in = self.input_dim;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.out_dim() == 0 {
                return Err(format!("layer[{idx}] out_dim must be > 0"));
            }
            if layer.bias.len() != layer.out_dim() {
                return Err(format!(
                    "layer[{idx}] bias len {} != out_dim {}",
                    layer.bias.len(),
                    layer.out_dim()
                ));
            }
            for (r, row) in layer.weights.iter().enumerate() {
                if row.len() != expected_in {
                    return Err(format!(
                        "layer[{idx}] weights row {r} len {} != expected in_dim {expected_in}",
                        row.len()
                    ));
                }
                if row.iter().any(|v| !v.is_finite()) {
                    return Err(format!("layer[{idx}] weights contain non-finite values"));
                }
            }
            if layer.bias.iter().any(|v| !v.is_finite()) {
                return Err(format!("layer[{idx}] bias contain non-finite values"));
            }
            expected_in = layer.out_dim();
        }

        if self.classes.len() < 2 {
            return Err("classes must list at least 2 labels".to_string());
        }
        let head = self.output_dim();
        if head != 1 && head != self.classes.len() {
            return Err(format!(
                "output_dim {head} does not fit {} classes",
                self.classes.len()
            ));
        }
        if head == 1 && self.classes.len() != 2 {
            return Err("a single-unit head requires exactly 2 classes".to_string());
        }
        Ok(())
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map(|l| l.out_dim()).unwrap_or(0)
    }

    pub fn forward(&self, input: &[f64]) -> std::result::Result<Vec<f64>, PredictionError> {
        if input.len() != self.input_dim {
            return Err(PredictionError::shape(format!(
                "input dim mismatch: got {}, expected {}",
                input.len(),
                self.input_dim
            )));
        }

        let mut x: Vec<f64> = match (&self.input_mean, &self.input_std) {
            (Some(mean), Some(std)) => input
                .iter()
                .zip(mean.iter().zip(std))
                .map(|(v, (m, s))| (v - m) / s.max(1e-12))
                .collect(),
            _ => input.to_vec(),
        };

        for layer in &self.layers {
            debug_assert_eq!(layer.in_dim(), x.len());
            x = layer.apply(&x);
        }
        Ok(x)
    }
}

impl Oracle for DenseClassifier {
    fn predict(&self, features: &FeatureVector) -> std::result::Result<i64, PredictionError> {
        let proba = self.predict_proba(features)?;
        let idx = argmax(&proba)?;
        Ok(self.classes[idx])
    }

    fn predict_proba(
        &self,
        features: &FeatureVector,
    ) -> std::result::Result<Vec<f64>, PredictionError> {
        let mut out = self.forward(features.values())?;
        if out.iter().any(|v| !v.is_finite()) {
            return Err(PredictionError::numeric(format!(
                "model produced non-finite output {out:?}"
            )));
        }

        let last = self.layers.last().map(|l| l.activation);
        if out.len() == 1 {
            let p = match last {
                Some(Activation::Sigmoid) => out[0],
                _ => sigmoid(out[0]),
            };
            return Ok(vec![1.0 - p, p]);
        }
        if last != Some(Activation::Softmax) {
            softmax_in_place(&mut out);
        }
        Ok(out)
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn describe(&self) -> String {
        let hidden: Vec<usize> = self.layers.iter().map(|l| l.out_dim()).collect();
        format!("dense(input={}, layers={:?})", self.input_dim, hidden)
    }
}

fn apply_activation(x: f64, act: Activation) -> f64 {
    match act {
        Activation::Linear | Activation::Softmax => x,
        Activation::Relu => x.max(0.0),
        Activation::Tanh => x.tanh(),
        Activation::Sigmoid => sigmoid(x),
    }
}

fn sigmoid(x: f64) -> f64 {
    // Numerically-stable sigmoid.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

fn softmax_in_place(row: &mut [f64]) {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in row.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        row.iter_mut().for_each(|v| *v /= sum);
    }
}
