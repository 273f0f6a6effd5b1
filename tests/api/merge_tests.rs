//! Integration tests for POST /merge.

use crate::common::*;
use axum::http::StatusCode;
use guest_merge::infrastructure::Fault;
use rstest::rstest;
use serde_json::json;

async fn guest_with_notes(app: &TestApp, titles: &[&str]) -> String {
    let guest_cookie = app.visit_as_guest().await;
    for title in titles {
        let response = app
            .post("/notes", Some(&guest_cookie), Some(json!({"title": title})))
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
    }
    guest_cookie
}

#[rstest]
#[tokio::test]
async fn merge_moves_guest_notes_and_clears_the_cookie() {
    let app = TestApp::new();
    let guest_cookie = guest_with_notes(&app, &["One", "Two"]).await;
    let session_cookie = app.sign_in("dev@example.com").await;
    let both = cookies(&[&guest_cookie, &session_cookie]);

    let response = app.post("/merge", Some(&both), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"success": true, "data": {"mergedCount": 2, "alreadyMerged": false}})
    );
    let removal = response.set_cookies.iter().find(|cookie| cookie.starts_with("guest_session_id="));
    assert!(removal.unwrap().contains("Max-Age=0"));

    let notes = app.get("/notes", Some(&session_cookie)).await;
    assert_eq!(notes.body.as_array().unwrap().len(), 2);
    assert!(
        notes.body.as_array().unwrap()
            .iter()
            .all(|note| note["owner_id"] == "dev@example.com")
    );
}

#[rstest]
#[tokio::test]
async fn archived_guest_notes_are_merged_too() {
    let app = TestApp::new();
    let guest_cookie = guest_with_notes(&app, &["Keep"]).await;
    let archived = app
        .post("/notes", Some(&guest_cookie), Some(json!({"title": "Gone"})))
        .await;
    let note_id = archived.body["id"].as_str().unwrap().to_string();
    app.post(&format!("/notes/{note_id}/archive"), Some(&guest_cookie), None)
        .await;
    let session_cookie = app.sign_in("dev@example.com").await;

    let response = app
        .post("/merge", Some(&cookies(&[&guest_cookie, &session_cookie])), None)
        .await;

    assert_eq!(response.body["data"]["mergedCount"], 2);
    let all = app
        .get("/notes?include_archived=true", Some(&session_cookie))
        .await;
    assert_eq!(all.body.as_array().unwrap().len(), 2);
}

#[rstest]
#[tokio::test]
async fn repeated_merge_reports_already_merged() {
    let app = TestApp::new();
    let guest_cookie = guest_with_notes(&app, &["One", "Two"]).await;
    let session_cookie = app.sign_in("dev@example.com").await;
    let both = cookies(&[&guest_cookie, &session_cookie]);

    app.post("/merge", Some(&both), None).await;
    let repeated = app.post("/merge", Some(&both), None).await;

    assert_eq!(repeated.status, StatusCode::OK);
    assert_eq!(
        repeated.body,
        json!({"success": true, "data": {"mergedCount": 2, "alreadyMerged": true}})
    );
    assert_eq!(app.store.ledger_entries().await.len(), 1);
}

#[rstest]
#[tokio::test]
async fn guest_cannot_merge() {
    let app = TestApp::new();
    let guest_cookie = guest_with_notes(&app, &["One"]).await;

    let response = app.post("/merge", Some(&guest_cookie), None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body,
        json!({"success": false, "error": "Authentication required to merge guest data"})
    );
    assert!(app.store.ledger_entries().await.is_empty());
}

#[rstest]
#[tokio::test]
async fn signed_in_user_without_guest_token_merges_nothing() {
    let app = TestApp::new();
    let session_cookie = app.sign_in("dev@example.com").await;

    let response = app.post("/merge", Some(&session_cookie), None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!({"success": true, "data": {"mergedCount": 0, "alreadyMerged": false}})
    );
    assert!(response.set_cookies.is_empty());
}

#[rstest]
#[tokio::test]
async fn storage_failure_is_reported_generically() {
    let app = TestApp::new();
    let guest_cookie = guest_with_notes(&app, &["One"]).await;
    let session_cookie = app.sign_in("dev@example.com").await;
    app.store.inject(Fault::LedgerWrite);

    let response = app
        .post("/merge", Some(&cookies(&[&guest_cookie, &session_cookie])), None)
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.body,
        json!({"success": false, "error": "Failed to merge guest data. Please try again."})
    );
    assert!(response.set_cookies.is_empty());
    let still_guest = app.get("/notes", Some(&guest_cookie)).await;
    assert_eq!(still_guest.body.as_array().unwrap().len(), 1);
}

#[rstest]
#[tokio::test]
async fn forged_guest_cookie_cannot_reach_a_users_records() {
    let app = TestApp::new();
    let victim_session = app.sign_in("victim@example.com").await;
    let created = app
        .post("/notes", Some(&victim_session), Some(json!({"title": "Secret"})))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let forged = "guest_session_id=victim@example.com";

    let listed = app.get("/notes", Some(forged)).await;
    let attacker_session = app.sign_in("attacker@example.com").await;
    let merged = app
        .post("/merge", Some(&cookies(&[forged, &attacker_session])), None)
        .await;

    assert_eq!(listed.status, StatusCode::OK);
    assert!(listed.body.as_array().unwrap().is_empty());
    assert!(listed.guest_cookie().is_some());
    assert_eq!(
        merged.body,
        json!({"success": true, "data": {"mergedCount": 0, "alreadyMerged": false}})
    );
    let victim_notes = app.get("/notes", Some(&victim_session)).await;
    let attacker_notes = app.get("/notes", Some(&attacker_session)).await;
    assert_eq!(victim_notes.body.as_array().unwrap().len(), 1);
    assert!(attacker_notes.body.as_array().unwrap().is_empty());
    assert!(app.store.ledger_entries().await.is_empty());
}

#[rstest]
#[tokio::test]
async fn user_with_non_ascii_email_can_merge() {
    let app = TestApp::new();
    let guest_cookie = guest_with_notes(&app, &["Café"]).await;
    let session_cookie = app.sign_in("josé@example.com").await;

    let response = app
        .post("/merge", Some(&cookies(&[&guest_cookie, &session_cookie])), None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["mergedCount"], 1);
}
