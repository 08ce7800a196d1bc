use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    Json,
};
use validator::Validate;

use crate::modules::auth::{
    crud::{AuthError, ConfirmOutcome, UserCrud},
    extractor::CurrentUser,
    schema::{
        AutoVerifyRequest, AutoVerifyResponse, ErrorResponse, LoginRequest, LoginResponse,
        MeResponse, MessageResponse, RegisterRequest, RegisterResponse, RegisteredUser,
        SessionUser,
    },
};
use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn error_response(e: AuthError) -> ErrorReply {
    let status = e.status_code();
    let body = match e {
        AuthError::Validation(details) => ErrorResponse::with_details("Validation failed", details),
        AuthError::Database(err) => {
            tracing::error!(error = %err, "auth database error");
            ErrorResponse::new("Internal server error")
        }
        AuthError::Hashing(err) => {
            tracing::error!(error = %err, "password hashing error");
            ErrorResponse::new("Internal server error")
        }
        other => ErrorResponse::new(other.to_string()),
    };
    (status, Json(body))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ErrorReply> {
    let mut details = Vec::new();

    if let Err(errors) = req.validate() {
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .clone()
                    .unwrap_or_else(|| error.code.clone());
                details.push(format!("{field}: {message}"));
            }
        }
    }
    if req.password.trim().is_empty() {
        details.push("password: must not be blank".to_string());
    }
    if !details.is_empty() {
        return Err(error_response(AuthError::Validation(details)));
    }

    let crud = UserCrud::new(state.db.clone());
    let user = crud
        .register(req.email.trim(), &req.password)
        .await
        .map_err(error_response)?;

    // Confirmation mail is best-effort: dispatch in the background and only
    // log failures, the registration itself already succeeded.
    if let Some(token) = user.confirmation_token.clone() {
        let mailer = state.mailer.clone();
        let to = user.email.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_confirmation_email(&to, &token).await {
                tracing::warn!(error = %e, email = %to, "failed to send confirmation email");
            }
        });
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. Please check your email to confirm your account.",
            user: RegisteredUser {
                id: user.id,
                email: user.email,
            },
        }),
    ))
}

pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, ErrorReply> {
    let crud = UserCrud::new(state.db.clone());

    let message = match crud.confirm(&token).await.map_err(error_response)? {
        ConfirmOutcome::Confirmed => "Account confirmed successfully",
        ConfirmOutcome::AlreadyConfirmed => "Account is already confirmed",
    };

    Ok(Json(MessageResponse { message }))
}

pub async fn auto_verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AutoVerifyRequest>,
) -> Result<Json<AutoVerifyResponse>, ErrorReply> {
    let email = match req.email.as_deref().map(str::trim) {
        Some(email) if !email.is_empty() => email.to_string(),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Email is required")),
            ));
        }
    };

    let crud = UserCrud::new(state.db.clone());
    let user = crud.auto_verify(&email).await.map_err(error_response)?;

    Ok(Json(AutoVerifyResponse {
        message: "Account verified successfully",
        user: SessionUser::from(&user),
    }))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<LoginResponse>), ErrorReply> {
    let crud = UserCrud::new(state.db.clone());
    let user = crud
        .login(req.email.trim(), &req.password)
        .await
        .map_err(|e| match e {
            // An unknown email keeps its tailored message but must not leak
            // existence through the status code at login.
            AuthError::UserNotFound => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(AuthError::UserNotFound.to_string())),
            ),
            other => error_response(other),
        })?;

    let token = state
        .sessions
        .create_session_token(&user.id, &user.email)
        .map_err(|e| {
            tracing::error!(error = %e, "failed to create session token");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error")),
            )
        })?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.sessions.session_cookie(&token))],
        Json(LoginResponse {
            message: "Login successful",
            user: SessionUser::from(&user),
        }),
    ))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Result<Json<MeResponse>, ErrorReply> {
    // The session alone is not enough here; verification is re-checked
    // against the freshly loaded row.
    if !user.is_verified {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::unverified(
                "Account is not verified. Please check your email and click the confirmation link to verify your account.",
            )),
        ));
    }

    Ok(Json(MeResponse {
        user: SessionUser::from(&user),
    }))
}
