//! API and startup errors

use axum::{
    extract::rejection::{JsonRejection, StringRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use feature_engine::WindowError;
use inference_engine::InferenceError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors that stop the service from starting
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("metrics setup failed: {0}")]
    Metrics(String),
    #[error("invalid rate limit configuration: {0}")]
    RateLimit(String),
}

/// Request-level failure rendered as `{"detail": "..."}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "rejected",
            ApiError::ServiceUnavailable(_) => "unavailable",
            ApiError::Internal(_) => "failed",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::ModelUnavailable => ApiError::ServiceUnavailable(err.to_string()),
            InferenceError::InvalidInputShape { .. } => ApiError::BadRequest(err.to_string()),
            InferenceError::InferenceFailed(_)
            | InferenceError::ModelLoadError(_)
            | InferenceError::Scaling(_) => {
                error!("Prediction failed: {}", err);
                ApiError::Internal("Prediction failed".to_string())
            }
        }
    }
}

impl From<WindowError> for ApiError {
    fn from(err: WindowError) -> Self {
        match err {
            WindowError::Scaling(_) => {
                error!("Window scaling failed: {}", err);
                ApiError::Internal("Prediction failed".to_string())
            }
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<StringRejection> for ApiError {
    fn from(rejection: StringRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
