//! Classifier backends behind the `Oracle` seam.
//!
//! The dense backend is dependency-light JSON; ONNX graphs are available behind
//! the `onnx` cargo feature.

pub mod dense;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod oracle;

pub use dense::{Activation, DenseClassifier, DenseLayer};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use oracle::{ModelArtifact, Oracle, PipelineSpec};
