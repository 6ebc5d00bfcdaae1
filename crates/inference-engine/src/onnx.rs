//! ONNX Sequence Model (tract)

use crate::predictor::RulPredictor;
use crate::InferenceError;
use feature_engine::WindowShape;
use ndarray::{Array2, Array3, Axis};
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Sequence model exported to ONNX, optimized once at load time.
///
/// The plan is built for a batch of one; batches are run sample by sample.
pub struct OnnxPredictor {
    plan: OnnxPlan,
    shape: WindowShape,
    name: String,
}

impl OnnxPredictor {
    /// Load and optimize a model expecting `[1, time_steps, features]` f32 input
    pub fn load(path: &Path, shape: WindowShape) -> Result<Self, InferenceError> {
        info!("Loading ONNX model from {} for input {}", path.display(), shape);

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| {
                model.with_input_fact(0, f32::fact([1, shape.time_steps, shape.num_features]).into())
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "onnx".to_string());

        info!("Model {} loaded successfully", name);
        Ok(Self { plan, shape, name })
    }

    fn run_one(&self, values: Vec<f32>) -> Result<f32, InferenceError> {
        let input: Tensor = tract_ndarray::Array3::from_shape_vec(
            (1, self.shape.time_steps, self.shape.num_features),
            values,
        )
        .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?
        .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced no outputs".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        view.iter()
            .next()
            .copied()
            .ok_or_else(|| InferenceError::InferenceFailed("model produced an empty output".to_string()))
    }
}

impl RulPredictor for OnnxPredictor {
    fn predict(&self, batch: &Array3<f32>) -> Result<Array2<f32>, InferenceError> {
        let batch_size = batch.len_of(Axis(0));
        let mut out = Array2::zeros((batch_size, 1));
        for (i, sample) in batch.outer_iter().enumerate() {
            out[[i, 0]] = self.run_one(sample.iter().copied().collect())?;
        }
        debug!("ONNX batch of {} complete", batch_size);
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
