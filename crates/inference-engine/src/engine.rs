//! Inference Engine Implementation

use crate::onnx::OnnxPredictor;
use crate::predictor::{MockPredictor, RulPredictor};
use crate::InferenceError;
use data_validator::ScalerState;
use feature_engine::{FeatureWindow, ReceivedShape, WindowShape};
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Reference lifespan used to clamp and normalise RUL estimates
pub const MAX_RUL: f64 = 125.0;

/// Remaining useful life in cycles, always within `[0, max_rul]`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct RulEstimate(f64);

impl RulEstimate {
    /// Clamp a raw model output into `[0, max_rul]`
    pub fn clamped(raw: f64, max_rul: f64) -> Self {
        Self(raw.clamp(0.0, max_rul))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Result of inference operation
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// Clamped estimate
    pub rul: RulEstimate,
    /// Model output before clamping
    pub raw_output: f64,
    /// Inference latency in milliseconds
    pub latency_ms: u64,
}

/// Where to find the persisted model artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub model_path: Option<PathBuf>,
    pub scaler_path: Option<PathBuf>,
    pub shape: WindowShape,
    pub max_rul: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            scaler_path: None,
            shape: WindowShape::CANONICAL,
            max_rul: MAX_RUL,
        }
    }
}

/// Strict exact-shape check on a raw matrix
pub fn validate_shape<R: AsRef<[f64]>>(
    rows: &[R],
    expected_time_steps: usize,
    expected_features: usize,
) -> Result<(), InferenceError> {
    WindowShape::new(expected_time_steps, expected_features).check(rows)?;
    Ok(())
}

/// Wraps the loaded sequence model with shape, scaling, and clamping rules.
///
/// Built once at startup and shared read-only between requests. A missing
/// model is an explicit state reported as [`InferenceError::ModelUnavailable`].
pub struct InferenceEngine {
    predictor: Option<Arc<dyn RulPredictor>>,
    scaler: Option<ScalerState>,
    shape: WindowShape,
    max_rul: f64,
}

impl InferenceEngine {
    /// Create an engine with no model loaded
    pub fn new(shape: WindowShape, max_rul: f64) -> Self {
        Self {
            predictor: None,
            scaler: None,
            shape,
            max_rul,
        }
    }

    /// Load model and scaler artifacts. Missing or broken artifacts leave the
    /// engine unloaded instead of failing startup.
    pub fn load(config: &EngineConfig) -> Self {
        let predictor = match &config.model_path {
            None => {
                warn!("No model path configured; predictions will be unavailable");
                None
            }
            Some(path) if !path.exists() => {
                warn!("Model file {} missing; predictions will be unavailable", path.display());
                None
            }
            Some(path) => match OnnxPredictor::load(path, config.shape) {
                Ok(p) => Some(Arc::new(p) as Arc<dyn RulPredictor>),
                Err(e) => {
                    error!("{}", e);
                    None
                }
            },
        };

        Self::from_artifacts(config, predictor)
    }

    /// Pair an already-loaded model with the configured scaler.
    ///
    /// A configured scaler that is missing, unreadable or sized for a
    /// different feature count drops the model. Only `scaler_path: None`
    /// serves unscaled input.
    pub fn from_artifacts(config: &EngineConfig, predictor: Option<Arc<dyn RulPredictor>>) -> Self {
        let mut engine = Self::new(config.shape, config.max_rul);
        engine.predictor = predictor;

        if let Some(path) = &config.scaler_path {
            let loaded = if path.exists() {
                ScalerState::load(path).map_err(InferenceError::from)
            } else {
                Err(InferenceError::ModelLoadError(format!(
                    "scaler file {} missing",
                    path.display()
                )))
            };

            if let Err(e) = loaded.and_then(|scaler| engine.set_scaler(scaler)) {
                error!("{}; refusing to serve without the configured scaler", e);
                engine.predictor = None;
                engine.scaler = None;
            }
        }

        info!(
            "Inference engine ready: model_loaded={}, scaler_loaded={}",
            engine.is_loaded(),
            engine.has_scaler()
        );
        engine
    }

    /// Create an engine backed by the deterministic mock model
    pub fn mock() -> Self {
        info!("Creating mock inference engine");
        Self::new(WindowShape::CANONICAL, MAX_RUL).with_predictor(Arc::new(MockPredictor::default()))
    }

    /// Attach a model
    pub fn with_predictor(mut self, predictor: Arc<dyn RulPredictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    /// Attach a fitted scaler
    pub fn with_scaler(mut self, scaler: ScalerState) -> Result<Self, InferenceError> {
        self.set_scaler(scaler)?;
        Ok(self)
    }

    fn set_scaler(&mut self, scaler: ScalerState) -> Result<(), InferenceError> {
        if scaler.num_features() != self.shape.num_features {
            return Err(InferenceError::ModelLoadError(format!(
                "scaler has {} features, model expects {}",
                scaler.num_features(),
                self.shape.num_features
            )));
        }
        self.scaler = Some(scaler);
        Ok(())
    }

    /// Check if a model is loaded
    pub fn is_loaded(&self) -> bool {
        self.predictor.is_some()
    }

    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.predictor.as_deref().map(|p| p.name())
    }

    pub fn shape(&self) -> WindowShape {
        self.shape
    }

    pub fn max_rul(&self) -> f64 {
        self.max_rul
    }

    /// Validate a raw matrix against the window contract
    pub fn validate<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<FeatureWindow, InferenceError> {
        Ok(FeatureWindow::from_rows(rows, self.shape)?)
    }

    fn predictor(&self) -> Result<Arc<dyn RulPredictor>, InferenceError> {
        self.predictor.clone().ok_or(InferenceError::ModelUnavailable)
    }

    /// Shape-check, scale, and stack windows into a model batch
    fn to_batch(&self, windows: &[FeatureWindow]) -> Result<Array3<f32>, InferenceError> {
        let mut values = Vec::with_capacity(windows.len() * self.shape.time_steps * self.shape.num_features);
        for window in windows {
            if window.shape() != self.shape {
                return Err(InferenceError::InvalidInputShape {
                    expected: self.shape,
                    received: ReceivedShape::Rect {
                        rows: window.shape().time_steps,
                        cols: window.shape().num_features,
                    },
                });
            }
            match &self.scaler {
                Some(scaler) => values.extend(window.scaled(scaler)?.to_f32_vec()),
                None => values.extend(window.to_f32_vec()),
            }
        }

        Array3::from_shape_vec(
            (windows.len(), self.shape.time_steps, self.shape.num_features),
            values,
        )
        .map_err(|e| InferenceError::InferenceFailed(e.to_string()))
    }

    fn estimates(&self, output: Array2<f32>, expected: usize) -> Result<Vec<RulEstimate>, InferenceError> {
        if output.dim() != (expected, 1) {
            return Err(InferenceError::InferenceFailed(format!(
                "model returned shape {:?}, expected ({}, 1)",
                output.dim(),
                expected
            )));
        }

        output
            .column(0)
            .iter()
            .map(|&raw| {
                let raw = f64::from(raw);
                if raw.is_finite() {
                    Ok(RulEstimate::clamped(raw, self.max_rul))
                } else {
                    Err(InferenceError::InferenceFailed("model returned a non-finite value".to_string()))
                }
            })
            .collect()
    }

    /// Run one window on the blocking pool so the async executor is never stalled
    pub async fn predict(&self, window: &FeatureWindow) -> Result<InferenceResult, InferenceError> {
        let predictor = self.predictor()?;
        let batch = self.to_batch(std::slice::from_ref(window))?;
        let max_rul = self.max_rul;

        tokio::task::spawn_blocking(move || run_single(predictor.as_ref(), &batch, max_rul))
            .await
            .map_err(|e| InferenceError::InferenceFailed(format!("inference task aborted: {e}")))?
    }

    /// Check availability, validate the raw matrix, then predict
    pub async fn predict_rows<R: AsRef<[f64]>>(&self, rows: &[R]) -> Result<InferenceResult, InferenceError> {
        if !self.is_loaded() {
            return Err(InferenceError::ModelUnavailable);
        }
        let window = self.validate(rows)?;
        self.predict(&window).await
    }

    /// Run several windows as one batch (offline evaluation)
    pub fn predict_batch(&self, windows: &[FeatureWindow]) -> Result<Vec<RulEstimate>, InferenceError> {
        let predictor = self.predictor()?;
        if windows.is_empty() {
            return Ok(Vec::new());
        }
        let batch = self.to_batch(windows)?;
        let output = predictor.predict(&batch)?;
        self.estimates(output, windows.len())
    }

    /// Release the model and scaler
    pub fn unload(&mut self) {
        if let Some(name) = self.model_name() {
            info!("Unloading model {}", name);
        }
        self.predictor = None;
        self.scaler = None;
    }
}

fn run_single(
    predictor: &dyn RulPredictor,
    batch: &Array3<f32>,
    max_rul: f64,
) -> Result<InferenceResult, InferenceError> {
    let start = Instant::now();
    let output = predictor.predict(batch)?;

    if output.dim() != (1, 1) {
        return Err(InferenceError::InferenceFailed(format!(
            "model returned shape {:?}, expected (1, 1)",
            output.dim()
        )));
    }
    let raw_output = f64::from(output[[0, 0]]);
    if !raw_output.is_finite() {
        return Err(InferenceError::InferenceFailed(
            "model returned a non-finite value".to_string(),
        ));
    }

    let latency_ms = start.elapsed().as_millis() as u64;
    debug!("Inference completed in {}ms (raw={:.3})", latency_ms, raw_output);

    Ok(InferenceResult {
        rul: RulEstimate::clamped(raw_output, max_rul),
        raw_output,
        latency_ms,
    })
}
