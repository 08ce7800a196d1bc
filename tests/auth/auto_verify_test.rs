use axum::http::StatusCode;
use serde_json::json;

use crate::common::{register_user, test_email, TestContext};

#[tokio::test]
async fn auto_verify_marks_account_verified() {
    let ctx = TestContext::new().await;
    let email = test_email();
    register_user(&ctx, &email).await;

    let response = ctx
        .server
        .post("/auth/auto-verify")
        .json(&json!({ "email": &email }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["isVerified"], true);

    let is_verified: bool = sqlx::query_scalar("SELECT is_verified FROM users WHERE email = ?")
        .bind(&email)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert!(is_verified);
}

#[tokio::test]
async fn auto_verify_clears_the_confirmation_token() {
    let ctx = TestContext::new().await;
    let email = test_email();
    register_user(&ctx, &email).await;

    ctx.server
        .post("/auth/auto-verify")
        .json(&json!({ "email": &email }))
        .await
        .assert_status_ok();

    // Verified accounts never keep a live confirmation token, no matter
    // which path verified them.
    let (token, expires_at): (Option<String>, Option<String>) = sqlx::query_as(
        "SELECT confirmation_token, confirmation_token_expires_at FROM users WHERE email = ?",
    )
    .bind(&email)
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert!(token.is_none());
    assert!(expires_at.is_none());
}

#[tokio::test]
async fn auto_verify_is_idempotent() {
    let ctx = TestContext::new().await;
    let email = test_email();
    register_user(&ctx, &email).await;

    for _ in 0..2 {
        ctx.server
            .post("/auth/auto-verify")
            .json(&json!({ "email": &email }))
            .await
            .assert_status_ok();
    }
}

#[tokio::test]
async fn auto_verify_with_unknown_email_returns_not_found() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/auto-verify")
        .json(&json!({ "email": "nobody@example.com" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn auto_verify_without_email_returns_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx.server.post("/auth/auto-verify").json(&json!({})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Email is required");
}
