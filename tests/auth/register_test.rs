use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use crate::common::{test_email, test_password, TestContext};

#[tokio::test]
async fn register_creates_unverified_user_with_confirmation_token() {
    let ctx = TestContext::new().await;
    let email = test_email();

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({
            "email": &email,
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert!(body["message"].as_str().is_some());
    assert_eq!(body["user"]["email"], email);
    assert!(body["user"]["id"].as_str().is_some());

    let (is_verified, token, expires_at): (bool, Option<String>, Option<DateTime<Utc>>) =
        sqlx::query_as(
            "SELECT is_verified, confirmation_token, confirmation_token_expires_at FROM users WHERE email = ?",
        )
        .bind(&email)
        .fetch_one(&ctx.db)
        .await
        .unwrap();

    assert!(!is_verified);
    assert!(token.is_some());

    // Token expiry sits 24 hours out, give or take test runtime.
    let expires_at = expires_at.unwrap();
    let expected = Utc::now() + Duration::hours(24);
    assert!((expires_at - expected).num_seconds().abs() < 60);
}

#[tokio::test]
async fn register_with_duplicate_email_returns_conflict() {
    let ctx = TestContext::new().await;
    let email = test_email();

    ctx.server
        .post("/auth/register")
        .json(&json!({ "email": &email, "password": test_password() }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({ "email": &email, "password": test_password() }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn register_with_malformed_email_returns_field_details() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({ "email": "not-an-email", "password": test_password() }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    let details = body["details"].as_array().unwrap();
    assert!(details
        .iter()
        .any(|d| d.as_str().unwrap().starts_with("email:")));
}

#[tokio::test]
async fn register_with_blank_password_returns_field_details() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/register")
        .json(&json!({ "email": test_email(), "password": "   " }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let body: serde_json::Value = response.json();
    let details = body["details"].as_array().unwrap();
    assert!(details
        .iter()
        .any(|d| d.as_str().unwrap().starts_with("password:")));
}

#[tokio::test]
async fn register_writes_confirmation_email_to_outbox() {
    let ctx = TestContext::new().await;
    let email = test_email();

    ctx.server
        .post("/auth/register")
        .json(&json!({ "email": &email, "password": test_password() }))
        .await
        .assert_status(StatusCode::CREATED);

    // Mail dispatch runs in the background; poll briefly for the file.
    let mut found = None;
    for _ in 0..50 {
        let entries: Vec<_> = std::fs::read_dir(ctx.outbox.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        if let Some(entry) = entries.first() {
            found = Some(std::fs::read_to_string(entry.path()).unwrap());
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    let contents = found.expect("confirmation email should land in the outbox");
    assert!(contents.contains(&email));
    assert!(contents.contains("/auth/confirm/"));
}
