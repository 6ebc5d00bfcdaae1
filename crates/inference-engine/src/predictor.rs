//! Sequence Model Interface

use crate::InferenceError;
use ndarray::{Array2, Array3, Axis};

/// A loaded sequence model: `[batch, time_steps, features] -> [batch, 1]`
pub trait RulPredictor: Send + Sync {
    /// Run the model over a batch of windows
    fn predict(&self, batch: &Array3<f32>) -> Result<Array2<f32>, InferenceError>;

    /// Model name for logs and health output
    fn name(&self) -> &str;
}

/// Deterministic stand-in for the trained model (development and tests).
///
/// Predicts `intercept - slope * mean(window)`, so higher scaled sensor
/// values read as more wear.
#[derive(Debug, Clone)]
pub struct MockPredictor {
    intercept: f32,
    slope: f32,
}

impl MockPredictor {
    pub fn new(intercept: f32, slope: f32) -> Self {
        Self { intercept, slope }
    }
}

impl Default for MockPredictor {
    fn default() -> Self {
        Self::new(160.0, 120.0)
    }
}

impl RulPredictor for MockPredictor {
    fn predict(&self, batch: &Array3<f32>) -> Result<Array2<f32>, InferenceError> {
        let batch_size = batch.len_of(Axis(0));
        let mut out = Array2::zeros((batch_size, 1));
        for (i, sample) in batch.outer_iter().enumerate() {
            let mean = sample.mean().unwrap_or(0.0);
            out[[i, 0]] = self.intercept - self.slope * mean;
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_predictor_batch() {
        let mut batch = Array3::<f32>::zeros((2, 30, 24));
        batch.index_axis_mut(Axis(0), 1).fill(0.5);

        let out = MockPredictor::default().predict(&batch).unwrap();
        assert_eq!(out.dim(), (2, 1));
        assert_eq!(out[[0, 0]], 160.0);
        assert_eq!(out[[1, 0]], 100.0);
    }
}
