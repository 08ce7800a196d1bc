use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model::User;

// =============================================================================
// REGISTER
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: RegisteredUser,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: String,
    pub email: String,
}

// =============================================================================
// CONFIRM / AUTO-VERIFY
// =============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AutoVerifyRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AutoVerifyResponse {
    pub message: &'static str,
    pub user: SessionUser,
}

// =============================================================================
// LOGIN / ME
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: SessionUser,
}

#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            is_verified: user.is_verified,
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(rename = "isVerified", skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            is_verified: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details),
            is_verified: None,
        }
    }

    /// The verification-gate rejection carries the flag so the client can
    /// branch on it without parsing the message.
    pub fn unverified(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            is_verified: Some(false),
        }
    }
}
