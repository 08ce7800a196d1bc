use axum::http::StatusCode;
use chrono::{Duration, Utc};
use rand::RngCore;
use uuid::Uuid;

use crate::config::DbPool;
use crate::modules::auth::model::User;
use crate::services::hashing;

const CONFIRMATION_TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User with this email already exists")]
    EmailAlreadyExists,

    #[error("User not found. Please check your email address.")]
    UserNotFound,

    #[error("Invalid password. Please try again.")]
    InvalidPassword,

    #[error("Your account is not verified. Please check your email and click the confirmation link to verify your account.")]
    NotVerified,

    #[error("Invalid confirmation token")]
    InvalidConfirmationToken,

    #[error("Confirmation token has expired")]
    ConfirmationTokenExpired,

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Hashing error: {0}")]
    Hashing(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EmailAlreadyExists => StatusCode::CONFLICT,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            // Login failures, including the pre-authentication verification
            // check, are all unauthorized; only the per-request gate is 403.
            Self::InvalidPassword | Self::NotVerified => StatusCode::UNAUTHORIZED,
            Self::InvalidConfirmationToken | Self::ConfirmationTokenExpired => {
                StatusCode::BAD_REQUEST
            }
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub enum ConfirmOutcome {
    Confirmed,
    AlreadyConfirmed,
}

pub struct UserCrud {
    pool: DbPool,
}

impl UserCrud {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_confirmation_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE confirmation_token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
    }

    /// Creates an unverified user with a fresh confirmation token expiring in
    /// 24 hours. The caller is responsible for dispatching the confirmation
    /// email.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if self.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash =
            hashing::hash_password(password).map_err(|e| AuthError::Hashing(e.to_string()))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash,
            is_verified: false,
            confirmation_token: Some(generate_confirmation_token()),
            confirmation_token_expires_at: Some(
                now + Duration::hours(CONFIRMATION_TOKEN_TTL_HOURS),
            ),
            created_at: now,
            updated_at: now,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, is_verified, confirmation_token, confirmation_token_expires_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_verified)
        .bind(&user.confirmation_token)
        .bind(user.confirmation_token_expires_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            // Two registrations can pass the lookup concurrently; the unique
            // index on email settles it.
            if e.to_string().contains("UNIQUE constraint failed") {
                return Err(AuthError::EmailAlreadyExists);
            }
            return Err(AuthError::Database(e));
        }

        Ok(user)
    }

    /// Validates a confirmation token and marks its holder verified, clearing
    /// both token fields in the same statement. Confirming an
    /// already-verified holder succeeds without mutation.
    pub async fn confirm(&self, token: &str) -> Result<ConfirmOutcome, AuthError> {
        let user = self
            .find_by_confirmation_token(token)
            .await?
            .ok_or(AuthError::InvalidConfirmationToken)?;

        match user.confirmation_token_expires_at {
            Some(expires_at) if expires_at < Utc::now() => {
                return Err(AuthError::ConfirmationTokenExpired);
            }
            Some(_) => {}
            None => return Err(AuthError::InvalidConfirmationToken),
        }

        if user.is_verified {
            return Ok(ConfirmOutcome::AlreadyConfirmed);
        }

        self.mark_verified(&user.id).await?;
        Ok(ConfirmOutcome::Confirmed)
    }

    /// Development bypass for email delivery: verifies the account directly,
    /// clearing the token fields exactly like a confirmation click would.
    pub async fn auto_verify(&self, email: &str) -> Result<User, AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_verified {
            return Ok(user);
        }

        self.mark_verified(&user.id).await?;
        self.find_by_id(&user.id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Credential check for login. The verification check runs before the
    /// password check, so an unverified account can never obtain a session.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_verified {
            return Err(AuthError::NotVerified);
        }

        let is_valid = hashing::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if !is_valid {
            return Err(AuthError::InvalidPassword);
        }

        Ok(user)
    }

    /// Once an account is verified its token fields are nulled and never
    /// reused, regardless of which path verified it.
    async fn mark_verified(&self, user_id: &str) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_verified = TRUE, confirmation_token = NULL, confirmation_token_expires_at = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn generate_confirmation_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
