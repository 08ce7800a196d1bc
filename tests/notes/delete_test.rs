use axum::http::StatusCode;
use serde_json::json;

use crate::common::{bearer_token, register_and_confirm, test_email, verified_session, TestContext};

async fn create_note(ctx: &TestContext) -> i64 {
    let response = ctx
        .server
        .post("/notes")
        .json(&json!({ "title": "Ephemeral", "content": "c", "category": "Work" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    body["note"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn owner_can_delete_their_note() {
    let ctx = TestContext::new().await;
    verified_session(&ctx).await;
    let id = create_note(&ctx).await;

    let response = ctx.server.delete(&format!("/notes/{id}")).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Note deleted successfully");

    ctx.server
        .get(&format!("/notes/{id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_owner_delete_is_forbidden() {
    let ctx = TestContext::new().await;
    verified_session(&ctx).await;
    let id = create_note(&ctx).await;

    let other_email = test_email();
    register_and_confirm(&ctx, &other_email).await;
    let other = bearer_token(&ctx, &other_email).await;

    let response = ctx
        .server
        .delete(&format!("/notes/{id}"))
        .authorization_bearer(&other)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("delete"));

    // The note is still there.
    ctx.server
        .get(&format!("/notes/{id}"))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn delete_of_unknown_note_returns_not_found() {
    let ctx = TestContext::new().await;
    verified_session(&ctx).await;

    ctx.server
        .delete("/notes/999999")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_without_session_returns_unauthorized() {
    let ctx = TestContext::new().await;

    ctx.server
        .delete("/notes/1")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
