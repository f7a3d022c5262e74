//! Health Check API Tests

use axum::http::{header, StatusCode};

use crate::common::{body_json, TestApp};

/// Basic health check returns 200 with a status field
#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new();

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("version").is_some());
}

/// Liveness probe always returns 200
#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new();

    let response = app.get("/health/live").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "alive");
}

/// Metrics endpoint exposes Prometheus text format
#[tokio::test]
async fn test_metrics_endpoint() {
    let app = TestApp::new();

    let response = app.get("/metrics").await;

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));
}

/// Security headers are applied to all responses
#[tokio::test]
async fn test_security_headers_present() {
    let app = TestApp::new();

    let response = app.get("/health").await;

    let headers = response.headers();
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
}
