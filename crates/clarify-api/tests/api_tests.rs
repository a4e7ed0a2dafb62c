//! API integration tests.
//!
//! These exercise the router end to end with `tower::ServiceExt::oneshot`
//! against a coordinator staged in a temp directory. None of them require
//! ffmpeg: the sweeps either find an empty inbox or fail before any
//! external tool runs.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tempfile::TempDir;
use tower::ServiceExt;

use clarify_api::{create_router, metrics, ApiConfig, AppState};
use clarify_engine::CommandEnhancer;
use clarify_pipeline::{PipelineConfig, PipelineCoordinator};

// The recorder is process-global, so every test shares one handle.
static METRICS: OnceLock<PrometheusHandle> = OnceLock::new();

fn metrics_handle() -> PrometheusHandle {
    METRICS.get_or_init(metrics::init_metrics).clone()
}

fn test_router(root: &Path) -> Router {
    let pipeline_config = PipelineConfig {
        media_root: root.to_path_buf(),
        ..Default::default()
    };
    let audio = Arc::new(CommandEnhancer::new("enhance-speech"));
    let video = Arc::new(CommandEnhancer::new("enhance-frames"));
    let coordinator = Arc::new(PipelineCoordinator::new(pipeline_config, audio, video));

    let state = AppState::with_coordinator(ApiConfig::default(), coordinator);
    create_router(state, Some(metrics_handle()))
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let root = TempDir::new().unwrap();
    let app = test_router(root.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_security_headers() {
    let root = TempDir::new().unwrap();
    let app = test_router(root.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert!(headers.contains_key("X-Content-Type-Options"));
    assert!(headers.contains_key("X-Frame-Options"));
    assert!(headers.contains_key("X-Request-ID"));
}

#[tokio::test]
async fn test_request_id_passes_through() {
    let root = TempDir::new().unwrap();
    let app = test_router(root.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("X-Request-ID", "req-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("X-Request-ID").unwrap(),
        "req-abc-123"
    );
}

#[tokio::test]
async fn test_list_jobs_starts_empty() {
    let root = TempDir::new().unwrap();
    let app = test_router(root.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/jobs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["total"], 0);
    assert!(json["jobs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_unknown_job_returns_404() {
    let root = TempDir::new().unwrap();
    let app = test_router(root.path());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/jobs/no_such_job")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains("Job not found"));
}

#[tokio::test]
async fn test_process_audio_empty_inbox_returns_404() {
    let root = TempDir::new().unwrap();
    let app = test_router(root.path());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/process/audio")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert!(json["detail"].as_str().unwrap().contains(".wav"));
}

#[tokio::test]
async fn test_process_media_empty_inbox_returns_404() {
    let root = TempDir::new().unwrap();
    let app = test_router(root.path());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/process/media")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_sweep_returns_500_and_job_stays_queryable() {
    let root = TempDir::new().unwrap();

    // A .wav that no probe will accept fails the job before any
    // enhancement work starts.
    let inbox = root.path().join("audio").join("input");
    std::fs::create_dir_all(&inbox).unwrap();
    std::fs::write(inbox.join("noise.wav"), b"this is not audio").unwrap();

    let app = test_router(root.path());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/process/audio")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The failed job is still visible for polling.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/jobs/noise")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["state"], "failed");
    assert!(json["error_message"].as_str().is_some());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let root = TempDir::new().unwrap();
    let app = test_router(root.path());

    // Drive one request through the middleware so something is recorded.
    let _ = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("clarify_http_requests_total"));
}

#[tokio::test]
async fn test_cors_preflight() {
    let root = TempDir::new().unwrap();
    let app = test_router(root.path());

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/jobs")
                .header("Origin", "http://localhost:3000")
                .header("Access-Control-Request-Method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::OK || response.status() == StatusCode::NO_CONTENT
    );
}
