//! Integration tests for the note endpoints.

use crate::common::*;
use axum::http::StatusCode;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test]
async fn guest_creates_and_lists_notes() {
    let app = TestApp::new();
    let guest_cookie = app.visit_as_guest().await;

    let created = app
        .post(
            "/notes",
            Some(&guest_cookie),
            Some(json!({"title": "  Groceries  ", "content": "milk"})),
        )
        .await;
    let listed = app.get("/notes", Some(&guest_cookie)).await;

    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["title"], "Groceries");
    assert_eq!(created.body["is_archived"], false);
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
    assert_eq!(listed.body[0]["id"], created.body["id"]);
}

#[rstest]
#[tokio::test]
async fn first_request_can_create_a_note_without_a_cookie() {
    let app = TestApp::new();

    let created = app
        .post("/notes", None, Some(json!({"title": "First"})))
        .await;

    assert_eq!(created.status, StatusCode::CREATED);
    let guest_cookie = created.guest_cookie().unwrap();
    assert_eq!(
        created.body["owner_id"],
        guest_cookie.trim_start_matches("guest_session_id=")
    );
}

#[rstest]
#[case(json!({"title": "   "}))]
#[case(json!({"title": "x".repeat(201)}))]
#[tokio::test]
async fn invalid_titles_are_rejected(#[case] body: serde_json::Value) {
    let app = TestApp::new();
    let guest_cookie = app.visit_as_guest().await;

    let response = app.post("/notes", Some(&guest_cookie), Some(body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");
}

#[rstest]
#[tokio::test]
async fn archived_notes_are_hidden_by_default() {
    let app = TestApp::new();
    let guest_cookie = app.visit_as_guest().await;
    let created = app
        .post("/notes", Some(&guest_cookie), Some(json!({"title": "Old"})))
        .await;
    let note_id = created.body["id"].as_str().unwrap().to_string();

    let archived = app
        .post(&format!("/notes/{note_id}/archive"), Some(&guest_cookie), None)
        .await;
    let active = app.get("/notes", Some(&guest_cookie)).await;
    let all = app
        .get("/notes?include_archived=true", Some(&guest_cookie))
        .await;

    assert_eq!(archived.status, StatusCode::NO_CONTENT);
    assert!(active.body.as_array().unwrap().is_empty());
    assert_eq!(all.body.as_array().unwrap().len(), 1);
    assert_eq!(all.body[0]["is_archived"], true);
}

#[rstest]
#[tokio::test]
async fn archiving_another_owners_note_is_not_found() {
    let app = TestApp::new();
    let owner_cookie = app.visit_as_guest().await;
    let stranger_cookie = app.visit_as_guest().await;
    let created = app
        .post("/notes", Some(&owner_cookie), Some(json!({"title": "Mine"})))
        .await;
    let note_id = created.body["id"].as_str().unwrap().to_string();

    let response = app
        .post(&format!("/notes/{note_id}/archive"), Some(&stranger_cookie), None)
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], "NOT_FOUND");
}
