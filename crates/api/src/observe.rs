//! Prometheus metrics for the prediction routes

use crate::error::ServerError;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub const PREDICTIONS_TOTAL: &str = "rul_predictions_total";
pub const INFERENCE_LATENCY_MS: &str = "rul_inference_latency_ms";
pub const FLEET_ENGINES_TOTAL: &str = "rul_fleet_engines_total";

/// Install the global recorder. Only the service binary calls this.
pub fn install_recorder() -> Result<PrometheusHandle, ServerError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))
}

pub fn record_prediction(route: &'static str, outcome: &'static str) {
    counter!(PREDICTIONS_TOTAL, "route" => route, "outcome" => outcome).increment(1);
}

pub fn record_latency(latency_ms: u64) {
    histogram!(INFERENCE_LATENCY_MS).record(latency_ms as f64);
}

pub fn record_fleet(engines: usize) {
    counter!(FLEET_ENGINES_TOTAL).increment(engines as u64);
}
