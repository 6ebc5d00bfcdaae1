//! RUL Inference Engine
//!
//! Validates model inputs against the window contract and runs the sequence
//! model using tract-onnx.

mod engine;
mod onnx;
mod predictor;

pub use engine::{validate_shape, EngineConfig, InferenceEngine, InferenceResult, RulEstimate, MAX_RUL};
pub use onnx::OnnxPredictor;
pub use predictor::{MockPredictor, RulPredictor};

use data_validator::ValidationError;
use feature_engine::{ReceivedShape, ShapeMismatch, WindowShape};
use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Machine learning model not available")]
    ModelUnavailable,
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Invalid input shape: expected {expected}, received {received}")]
    InvalidInputShape {
        expected: WindowShape,
        received: ReceivedShape,
    },
    #[error("Scaler rejected input: {0}")]
    Scaling(#[from] ValidationError),
}

impl From<ShapeMismatch> for InferenceError {
    fn from(err: ShapeMismatch) -> Self {
        InferenceError::InvalidInputShape {
            expected: err.expected,
            received: err.received,
        }
    }
}
