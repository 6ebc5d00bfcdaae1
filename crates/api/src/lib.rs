//! Jet-Engine RUL API Server
//!
//! REST API that turns sensor windows into RUL estimates and health
//! assessments.

use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use health_scorer::HealthScorer;
use inference_engine::{InferenceEngine, MockPredictor};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_governor::GovernorLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod error;
pub mod evaluation;
mod observe;
pub mod rate_limit;
pub mod routes;

pub use crate::config::{LoggingSettings, Settings};
pub use error::{ApiError, ServerError};

/// Process-wide state, built once at startup and read-only afterwards
pub struct AppContext {
    pub engine: InferenceEngine,
    pub scorer: HealthScorer,
    pub version: String,
    pub start_time: Instant,
    metrics: Option<PrometheusHandle>,
}

impl AppContext {
    pub fn new(engine: InferenceEngine, scorer: HealthScorer, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            engine,
            scorer,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            metrics,
        }
    }

    /// Load model artifacts (or the mock model) as configured
    pub fn from_settings(settings: &Settings, metrics: Option<PrometheusHandle>) -> Self {
        let model = &settings.model;
        let engine = if model.use_mock {
            warn!("Serving the mock model; predictions are not real");
            InferenceEngine::new(model.shape(), model.max_rul).with_predictor(Arc::new(MockPredictor::default()))
        } else {
            InferenceEngine::load(&model.engine_config())
        };
        Self::new(engine, HealthScorer::new(model.scoring_config()), metrics)
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub scaler_loaded: bool,
    pub model: Option<String>,
    /// `[time_steps, num_features]`
    pub input_shape: [usize; 2],
    pub version: String,
    pub uptime_seconds: u64,
}

/// Create the application router
pub fn create_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/predict", post(routes::predict::predict))
        .route("/predict/csv", post(routes::predict::predict_csv))
        .route("/fleet/predict", post(routes::fleet::predict_fleet))
        .with_state(ctx)
}

/// Health check handler
async fn health_handler(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    let shape = ctx.engine.shape();
    Json(HealthResponse {
        status: "online".to_string(),
        model_loaded: ctx.engine.is_loaded(),
        scaler_loaded: ctx.engine.has_scaler(),
        model: ctx.engine.model_name().map(str::to_string),
        input_shape: [shape.time_steps, shape.num_features],
        version: ctx.version.clone(),
        uptime_seconds: ctx.start_time.elapsed().as_secs(),
    })
}

async fn metrics_handler(State(ctx): State<Arc<AppContext>>) -> Response {
    match &ctx.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Initialize logging. `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), ServerError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| ServerError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| ServerError::Logging(e.to_string()))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Run the server until Ctrl-C / SIGTERM, then release the model
pub async fn run_server(settings: Settings) -> Result<(), ServerError> {
    let handle = observe::install_recorder()?;
    let ctx = Arc::new(AppContext::from_settings(&settings, Some(handle)));

    let mut app = create_router(Arc::clone(&ctx)).layer(TimeoutLayer::new(Duration::from_secs(
        settings.server.request_timeout_secs,
    )));
    if settings.rate_limit.enabled {
        let config = rate_limit::create_governor_config(&settings.rate_limit)?;
        info!(
            "Rate limiting: burst {} with one slot every {}s per client",
            settings.rate_limit.burst_size, settings.rate_limit.per_second
        );
        app = app.layer(GovernorLayer { config });
    }
    let app = app
        .layer(cors_layer(&settings.server.cors_origins))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&settings.server.addr).await?;
    info!("Starting API server on {}", settings.server.addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(ctx) {
        Ok(mut ctx) => ctx.engine.unload(),
        Err(_) => warn!("Context still shared at shutdown; model released on drop"),
    }
    info!("API server shut down gracefully");
    Ok(())
}
