//! Single-engine prediction routes

use axum::{
    extract::rejection::{JsonRejection, StringRejection},
    extract::State,
    Json,
};
use feature_engine::parse_window_csv;
use health_scorer::HealthAssessment;
use inference_engine::{InferenceError, InferenceResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::observe;
use crate::AppContext;

/// Body of `POST /predict`
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// `[time_steps][num_features]` matrix, oldest cycle first
    #[serde(alias = "data_window")]
    pub data: Vec<Vec<f64>>,
    #[serde(default, alias = "engineId")]
    pub engine_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<String>,
    pub predicted_rul: f64,
    #[serde(flatten)]
    pub assessment: HealthAssessment,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl PredictResponse {
    pub fn new(ctx: &AppContext, engine_id: Option<String>, rul: f64) -> Self {
        Self {
            engine_id,
            predicted_rul: round2(rul),
            assessment: ctx.scorer.score(rul),
        }
    }
}

fn finish(
    ctx: &AppContext,
    route: &'static str,
    engine_id: Option<String>,
    result: Result<InferenceResult, InferenceError>,
) -> Result<Json<PredictResponse>, ApiError> {
    match result {
        Ok(result) => {
            observe::record_prediction(route, "ok");
            observe::record_latency(result.latency_ms);
            let response = PredictResponse::new(ctx, engine_id, result.rul.value());
            info!(
                "Predicted rul={:.2} status={} engine={}",
                response.predicted_rul,
                response.assessment.status,
                response.engine_id.as_deref().unwrap_or("-")
            );
            Ok(Json(response))
        }
        Err(e) => {
            let err = ApiError::from(e);
            observe::record_prediction(route, err.outcome());
            Err(err)
        }
    }
}

/// `POST /predict`
pub async fn predict(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        observe::record_prediction("predict", "rejected");
        ApiError::from(rejection)
    })?;
    debug!("Predict request with {} cycles", request.data.len());

    let result = ctx.engine.predict_rows(&request.data).await;
    finish(&ctx, "predict", request.engine_id, result)
}

/// `POST /predict/csv`: one cycle per line, comma-separated
pub async fn predict_csv(
    State(ctx): State<Arc<AppContext>>,
    body: Result<String, StringRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let body = body.map_err(|rejection| {
        observe::record_prediction("predict_csv", "rejected");
        ApiError::from(rejection)
    })?;
    if !ctx.engine.is_loaded() {
        let err = ApiError::from(InferenceError::ModelUnavailable);
        observe::record_prediction("predict_csv", err.outcome());
        return Err(err);
    }

    let window = parse_window_csv(&body, ctx.engine.shape()).map_err(|e| {
        let err = ApiError::from(e);
        observe::record_prediction("predict_csv", err.outcome());
        err
    })?;

    let result = ctx.engine.predict(&window).await;
    finish(&ctx, "predict_csv", None, result)
}
