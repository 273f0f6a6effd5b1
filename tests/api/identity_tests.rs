//! Integration tests for GET /identity and guest token issuance.

use crate::common::*;
use axum::http::StatusCode;
use rstest::rstest;

#[rstest]
#[tokio::test]
async fn anonymous_visitor_is_issued_a_guest_identity() {
    let app = TestApp::new();

    let response = app.get("/identity", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["kind"], "guest");
    let guest_cookie = response.guest_cookie().unwrap();
    assert_eq!(
        guest_cookie,
        format!("guest_session_id={}", response.body["id"].as_str().unwrap())
    );
    assert!(response.set_cookies[0].contains("HttpOnly"));
    assert!(response.set_cookies[0].contains("SameSite=Lax"));
}

#[rstest]
#[tokio::test]
async fn returning_guest_keeps_the_same_token() {
    let app = TestApp::new();
    let guest_cookie = app.visit_as_guest().await;

    let response = app.get("/identity", Some(&guest_cookie)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.set_cookies.is_empty());
    assert_eq!(
        format!("guest_session_id={}", response.body["id"].as_str().unwrap()),
        guest_cookie
    );
}

#[rstest]
#[tokio::test]
async fn signed_in_user_wins_over_guest_token() {
    let app = TestApp::new();
    let guest_cookie = app.visit_as_guest().await;
    let session_cookie = app.sign_in("dev@example.com").await;

    let response = app
        .get("/identity", Some(&cookies(&[&guest_cookie, &session_cookie])))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["kind"], "user");
    assert_eq!(response.body["id"], "dev@example.com");
}

#[rstest]
#[tokio::test]
async fn stale_session_without_guest_token_has_no_identity() {
    let app = TestApp::new();

    let response = app
        .get("/identity", Some("authjs.session-token=expired"))
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["code"], "NO_IDENTITY");
    assert!(response.set_cookies.is_empty());
}
