//! Integration tests for the agent API endpoints

use agent_lib::{
    health::{Component, HealthRegistry},
    observability::AgentMetrics,
    sync::LinkState,
    SourceKind,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use telemetry_agent::api::{create_router, AppState};
use tower::ServiceExt;

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register_all().await;

    let metrics = AgentMetrics::new();
    let state = Arc::new(AppState::new(health_registry, metrics));
    let router = create_router(state.clone());

    (router, state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_healthz_returns_ok_when_relay_degraded() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .record_link(LinkState::Backoff, 12)
        .await;

    let (status, body) = get(app, "/healthz").await;

    // Buffering locally is still operational
    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "degraded");
    assert_eq!(
        health["components"]["relay"]["message"],
        "relay link backoff, 12 snapshots buffered"
    );
}

#[tokio::test]
async fn test_healthz_returns_503_when_runtime_unhealthy() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .record_runtime(&SourceKind::RUNTIME)
        .await;

    let (status, body) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(
        health["components"]["runtime"]["message"],
        "runtime sources failed: sandboxes, sandbox_stats, containers, container_stats"
    );
}

#[tokio::test]
async fn test_readyz_returns_503_until_wired() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/readyz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let readiness: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_readyz_returns_ok_when_ready() {
    let (app, state) = setup_test_app().await;
    state.health_registry.set_ready(true).await;

    let (status, body) = get(app, "/readyz").await;

    assert_eq!(status, StatusCode::OK);
    let readiness: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_readyz_returns_503_when_ready_but_unhealthy() {
    let (app, state) = setup_test_app().await;
    state.health_registry.set_ready(true).await;
    state
        .health_registry
        .record_runtime(&SourceKind::RUNTIME)
        .await;

    let (status, _) = get(app, "/readyz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state) = setup_test_app().await;

    state.metrics.observe_collection_latency(0.001);
    state.metrics.set_backlog(4, 120);
    state.metrics.inc_snapshots_sent();
    state.metrics.inc_snapshots_dropped("overwritten");

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("telemetry_agent_collection_latency_seconds"));
    assert!(metrics_text.contains("telemetry_agent_backlog_capacity"));
    assert!(metrics_text.contains("telemetry_agent_snapshots_sent_total"));
    assert!(metrics_text.contains("telemetry_agent_snapshots_dropped_total{reason=\"overwritten\"}"));
}

#[tokio::test]
async fn test_metrics_contains_histogram_buckets() {
    let (app, state) = setup_test_app().await;

    state.metrics.observe_collection_latency(0.001);
    state.metrics.observe_collection_latency(0.005);
    state.metrics.observe_collection_latency(0.01);

    let (_, body) = get(app, "/metrics").await;
    let metrics_text = String::from_utf8(body).unwrap();

    assert!(metrics_text.contains("telemetry_agent_collection_latency_seconds_bucket"));
    assert!(metrics_text.contains("telemetry_agent_collection_latency_seconds_count"));
    assert!(metrics_text.contains("telemetry_agent_collection_latency_seconds_sum"));
}

#[tokio::test]
async fn test_healthz_includes_component_details() {
    let (app, _state) = setup_test_app().await;

    let (_, body) = get(app, "/healthz").await;
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert!(health["components"].is_object());
    for component in Component::ALL {
        let name = component.as_str();
        assert!(health["components"][name].is_object(), "missing {name}");
    }
}
