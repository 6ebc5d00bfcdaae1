//! HTTP API tests

use api::{create_router, AppContext};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use feature_engine::WindowShape;
use health_scorer::HealthScorer;
use inference_engine::{InferenceEngine, MAX_RUL};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn mock_app() -> Router {
    create_router(Arc::new(AppContext::new(
        InferenceEngine::mock(),
        HealthScorer::default(),
        None,
    )))
}

fn unloaded_app() -> Router {
    create_router(Arc::new(AppContext::new(
        InferenceEngine::new(WindowShape::CANONICAL, MAX_RUL),
        HealthScorer::default(),
        None,
    )))
}

fn window(rows: usize, cols: usize, value: f64) -> Vec<Vec<f64>> {
    vec![vec![value; cols]; rows]
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_reports_missing_model() {
    let (status, body) = send(unloaded_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "online");
    assert_eq!(body["model_loaded"], false);
    assert_eq!(body["scaler_loaded"], false);
    assert_eq!(body["input_shape"], json!([30, 24]));
}

#[tokio::test]
async fn health_reports_loaded_model() {
    let (status, body) = send(mock_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model"], "mock");
}

#[tokio::test]
async fn predict_returns_assessment() {
    let (status, body) = send(
        mock_app(),
        post_json("/predict", json!({ "data": window(30, 24, 0.5) })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_rul"], 100.0);
    assert_eq!(body["health_percent"], 80.0);
    assert_eq!(body["status"], "Healthy");
    assert_eq!(body["risk_grade"], "A");
    assert_eq!(body["rul_history"].as_array().unwrap().len(), 11);
    assert_eq!(body["top_sensors"].as_array().unwrap().len(), 3);
    assert!(body.get("engine_id").is_none());
}

#[tokio::test]
async fn predict_is_deterministic() {
    let app = mock_app();
    let request = || post_json("/predict", json!({ "data": window(30, 24, 0.25) }));

    let (_, first) = send(app.clone(), request()).await;
    let (_, second) = send(app, request()).await;
    assert_eq!(first["predicted_rul"], second["predicted_rul"]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn predict_clamps_and_grades_worn_engine() {
    let (status, body) = send(
        mock_app(),
        post_json("/predict", json!({ "data_window": window(30, 24, 1.0), "engine_id": "ENG-042" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["engine_id"], "ENG-042");
    assert_eq!(body["predicted_rul"], 40.0);
    assert_eq!(body["status"], "Critical");
    assert_eq!(body["risk_grade"], "C");
}

#[tokio::test]
async fn predict_rejects_short_window() {
    let (status, body) = send(
        mock_app(),
        post_json("/predict", json!({ "data": window(29, 24, 0.5) })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Invalid input shape: expected (30, 24), received (29, 24)"
    );
}

#[tokio::test]
async fn predict_rejects_transposed_and_ragged_windows() {
    let (status, _) = send(
        mock_app(),
        post_json("/predict", json!({ "data": window(24, 30, 0.5) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut ragged = window(30, 24, 0.5);
    ragged[7].pop();
    let (status, body) = send(mock_app(), post_json("/predict", json!({ "data": ragged }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("expected (30, 24)"));

    let (status, _) = send(mock_app(), post_json("/predict", json!({ "data": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn predict_without_model_is_unavailable() {
    // model availability is checked before shape
    for data in [window(30, 24, 0.5), window(3, 2, 0.5)] {
        let (status, body) = send(unloaded_app(), post_json("/predict", json!({ "data": data }))).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["detail"], "Machine learning model not available");
    }
}

#[tokio::test]
async fn predict_rejects_malformed_body() {
    let (status, body) = send(
        mock_app(),
        post_json("/predict", json!({ "data": "not a matrix" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn predict_csv_accepts_text_window() {
    let line = vec!["0.5"; 24].join(",");
    let text = vec![line; 30].join("\n");
    let request = Request::builder()
        .method("POST")
        .uri("/predict/csv")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(text))
        .unwrap();

    let (status, body) = send(mock_app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_rul"], 100.0);
}

#[tokio::test]
async fn predict_csv_rejects_wrong_cycle_count() {
    let line = vec!["0.5"; 24].join(",");
    let text = vec![line; 12].join("\n");
    let request = Request::builder()
        .method("POST")
        .uri("/predict/csv")
        .body(Body::from(text))
        .unwrap();

    let (status, body) = send(mock_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("30"));
}

#[tokio::test]
async fn predict_csv_rejects_non_utf8_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/predict/csv")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(vec![0xff, 0xfe, 0xfd]))
        .unwrap();

    let (status, body) = send(mock_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn fleet_predict_summarises_valid_engines() {
    let body = json!({
        "engines": [
            { "engine_id": "A", "data": window(30, 24, 0.0) },
            { "engine_id": "B", "data": window(30, 24, 0.8) },
            { "engine_id": "C", "data": window(30, 24, 1.0) },
            { "engine_id": "D", "data": window(10, 24, 0.5) },
        ]
    });
    let (status, body) = send(mock_app(), post_json("/fleet/predict", body)).await;

    assert_eq!(status, StatusCode::OK);
    let engines = body["engines"].as_array().unwrap();
    assert_eq!(engines.len(), 4);
    assert_eq!(engines[0]["engine_id"], "A");
    assert_eq!(engines[0]["predicted_rul"], 125.0);
    assert_eq!(engines[0]["assessment"]["status"], "Healthy");
    assert_eq!(engines[2]["assessment"]["status"], "Critical");
    assert!(engines[3]["error"].as_str().unwrap().contains("received (10, 24)"));
    assert!(engines[3].get("assessment").is_none());

    assert_eq!(body["summary"]["total"], 3);
    assert_eq!(body["summary"]["healthy"], 1);
    assert_eq!(body["summary"]["critical"], 1);
    assert_eq!(body["summary"]["warning"], 1);
}

#[tokio::test]
async fn fleet_predict_without_model_is_unavailable() {
    let body = json!({ "engines": [{ "engine_id": "A", "data": window(30, 24, 0.5) }] });
    let (status, _) = send(unloaded_app(), post_json("/fleet/predict", body)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn metrics_without_recorder_is_not_found() {
    let response = mock_app().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn end_to_end_over_tcp() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, mock_app()).await.unwrap();
    });

    let client = reqwest::Client::new();
    let health: Value = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["model_loaded"], true);

    let response = client
        .post(format!("http://{addr}/predict"))
        .json(&json!({ "data": window(30, 24, 0.5), "engineId": "ENG-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["engine_id"], "ENG-1");
    assert_eq!(body["predicted_rul"], 100.0);
}
