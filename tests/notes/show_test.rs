use axum::http::StatusCode;
use serde_json::json;

use crate::common::{bearer_token, register_and_confirm, register_user, test_email, verified_session, TestContext};

#[tokio::test]
async fn any_verified_user_can_read_any_note() {
    let ctx = TestContext::new().await;
    let owner_email = verified_session(&ctx).await;

    let created = ctx
        .server
        .post("/notes")
        .json(&json!({ "title": "Shared", "content": "c", "category": "Work" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let created_body: serde_json::Value = created.json();
    let id = created_body["note"]["id"].as_i64().unwrap();

    let reader_email = test_email();
    register_and_confirm(&ctx, &reader_email).await;
    let reader = bearer_token(&ctx, &reader_email).await;

    let response = ctx
        .server
        .get(&format!("/notes/{id}"))
        .authorization_bearer(&reader)
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["note"]["title"], "Shared");
    assert_eq!(body["note"]["creator"]["email"], owner_email);
}

#[tokio::test]
async fn unknown_note_returns_not_found() {
    let ctx = TestContext::new().await;
    verified_session(&ctx).await;

    let response = ctx.server.get("/notes/999999").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn unverified_reader_is_rejected() {
    let ctx = TestContext::new().await;
    verified_session(&ctx).await;

    let created = ctx
        .server
        .post("/notes")
        .json(&json!({ "title": "t", "content": "c", "category": "Work" }))
        .await;
    let created_body: serde_json::Value = created.json();
    let id = created_body["note"]["id"].as_i64().unwrap();

    let email = test_email();
    register_user(&ctx, &email).await;
    let unverified = bearer_token(&ctx, &email).await;

    let response = ctx
        .server
        .get(&format!("/notes/{id}"))
        .authorization_bearer(&unverified)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn verification_is_rechecked_on_every_request() {
    let ctx = TestContext::new().await;
    let email = verified_session(&ctx).await;

    ctx.server.get("/notes").await.assert_status_ok();

    // Revoking verification after login locks the session out immediately.
    sqlx::query("UPDATE users SET is_verified = FALSE WHERE email = ?")
        .bind(&email)
        .execute(&ctx.db)
        .await
        .unwrap();

    let response = ctx.server.get("/notes").await;

    response.assert_status(StatusCode::FORBIDDEN);
}
