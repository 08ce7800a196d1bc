use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};

use crate::modules::auth::{crud::UserCrud, model::User, schema::ErrorResponse};
use crate::services::session::session_token_from_headers;
use crate::AppState;

const VERIFICATION_REQUIRED: &str = "Account is not verified. Please check your email and click the confirmation link to verify your account.";

type Rejection = (StatusCode, Json<ErrorResponse>);

fn unauthorized(message: &str) -> Rejection {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message)))
}

/// The authenticated caller, resolved from the session cookie (or a Bearer
/// header) and loaded fresh from the store. Does not enforce verification.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Rejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token_from_headers(&parts.headers)
            .ok_or_else(|| unauthorized("Not authenticated"))?;

        let claims = state
            .sessions
            .verify_session_token(&token)
            .map_err(|_| unauthorized("Invalid or expired session"))?
            .claims;

        let user = UserCrud::new(state.db.clone())
            .find_by_id(&claims.sub)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to load session user");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new("Internal server error")),
                )
            })?
            .ok_or_else(|| unauthorized("Not authenticated"))?;

        Ok(CurrentUser(user))
    }
}

/// The verification gate: an authenticated caller whose `is_verified` flag was
/// re-checked against the store for this request. Verification can be revoked
/// or granted between session issuance and use, so it is never trusted from
/// the token itself.
pub struct VerifiedUser(pub User);

impl FromRequestParts<Arc<AppState>> for VerifiedUser {
    type Rejection = Rejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_verified {
            return Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::unverified(VERIFICATION_REQUIRED)),
            ));
        }

        Ok(VerifiedUser(user))
    }
}
