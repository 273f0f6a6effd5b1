//! Integration tests for GET /health.

use crate::common::*;
use axum::http::StatusCode;
use rstest::rstest;

#[rstest]
#[tokio::test]
async fn health_returns_200_with_status() {
    let app = TestApp::new();

    let response = app.get("/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["version"], env!("CARGO_PKG_VERSION"));
}
