//! Fleet prediction route

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use feature_engine::FeatureWindow;
use health_scorer::{FleetSummary, HealthAssessment};
use inference_engine::InferenceError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::predict::round2;
use crate::error::ApiError;
use crate::observe;
use crate::AppContext;

/// Maximum engines accepted in one fleet request
pub const MAX_FLEET_SIZE: usize = 500;

#[derive(Debug, Deserialize)]
pub struct EngineWindow {
    #[serde(alias = "engineId")]
    pub engine_id: String,
    #[serde(alias = "data_window")]
    pub data: Vec<Vec<f64>>,
}

/// Body of `POST /fleet/predict`
#[derive(Debug, Deserialize)]
pub struct FleetRequest {
    pub engines: Vec<EngineWindow>,
}

/// Per-engine outcome; either an assessment or the reason it was rejected.
/// Rejected engines are left out of the summary.
#[derive(Debug, Serialize)]
pub struct EngineResult {
    pub engine_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_rul: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<HealthAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FleetResponse {
    pub engines: Vec<EngineResult>,
    pub summary: FleetSummary,
}

/// `POST /fleet/predict`
///
/// Windows are validated one by one; the valid ones run as a single batch on
/// the blocking pool.
pub async fn predict_fleet(
    State(ctx): State<Arc<AppContext>>,
    payload: Result<Json<FleetRequest>, JsonRejection>,
) -> Result<Json<FleetResponse>, ApiError> {
    let Json(request) = payload?;

    if !ctx.engine.is_loaded() {
        observe::record_prediction("fleet", "unavailable");
        return Err(InferenceError::ModelUnavailable.into());
    }
    if request.engines.len() > MAX_FLEET_SIZE {
        observe::record_prediction("fleet", "rejected");
        return Err(ApiError::BadRequest(format!(
            "Fleet request has {} engines, limit is {}",
            request.engines.len(),
            MAX_FLEET_SIZE
        )));
    }
    observe::record_fleet(request.engines.len());

    let mut results = Vec::with_capacity(request.engines.len());
    let mut windows: Vec<FeatureWindow> = Vec::new();
    let mut slots = Vec::new();

    for engine in request.engines {
        let error = match ctx.engine.validate(&engine.data) {
            Ok(window) => {
                slots.push(results.len());
                windows.push(window);
                None
            }
            Err(e) => {
                warn!("Fleet engine {} rejected: {}", engine.engine_id, e);
                Some(e.to_string())
            }
        };
        results.push(EngineResult {
            engine_id: engine.engine_id,
            predicted_rul: None,
            assessment: None,
            error,
        });
    }

    let batch_ctx = Arc::clone(&ctx);
    let estimates = tokio::task::spawn_blocking(move || batch_ctx.engine.predict_batch(&windows))
        .await
        .map_err(|e| {
            error!("Fleet inference task aborted: {}", e);
            ApiError::Internal("Prediction failed".to_string())
        })?
        .map_err(|e| {
            let err = ApiError::from(e);
            observe::record_prediction("fleet", err.outcome());
            err
        })?;

    for (slot, estimate) in slots.into_iter().zip(estimates) {
        let rul = estimate.value();
        let result = &mut results[slot];
        result.predicted_rul = Some(round2(rul));
        result.assessment = Some(ctx.scorer.score(rul));
    }

    let summary = FleetSummary::from_assessments(results.iter().filter_map(|r| r.assessment.as_ref()));
    observe::record_prediction("fleet", "ok");
    info!(
        "Fleet prediction: {} engines, {} healthy, {} warning, {} critical",
        summary.total, summary.healthy, summary.warning, summary.critical
    );

    Ok(Json(FleetResponse {
        engines: results,
        summary,
    }))
}
