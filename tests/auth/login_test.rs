use axum::http::StatusCode;
use serde_json::json;

use crate::common::{register_and_confirm, register_user, test_email, test_password, TestContext};

#[tokio::test]
async fn login_with_valid_credentials_sets_session_cookie() {
    let ctx = TestContext::new().await;
    let email = test_email();
    register_and_confirm(&ctx, &email).await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": test_password()
        }))
        .await;

    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["isVerified"], true);

    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("login should set a session cookie");
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn login_before_confirmation_is_rejected() {
    let ctx = TestContext::new().await;
    let email = test_email();
    register_user(&ctx, &email).await;

    // Correct credentials, but the account was never confirmed.
    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("not verified"));
    assert!(response.headers().get("set-cookie").is_none());
}

#[tokio::test]
async fn login_with_wrong_password_returns_unauthorized() {
    let ctx = TestContext::new().await;
    let email = test_email();
    register_and_confirm(&ctx, &email).await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": &email,
            "password": "wrong-password"
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn login_with_unknown_email_returns_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/login")
        .json(&json!({
            "email": "nonexistent@example.com",
            "password": test_password()
        }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert!(body.get("error").is_some());
}
