use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::AppState;

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Requested-With";

/// Credentialed CORS with an origin allow-list. Unknown origins get the
/// configured default origin back instead of a reflection of their own, so an
/// arbitrary site can never obtain credentialed access.
pub async fn cors_headers(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = allowed_origin(
        &state.config.allowed_origins,
        request.headers().get(header::ORIGIN),
    );

    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors(&mut response, &origin);
        response.headers_mut().insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static("3600"),
        );
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors(&mut response, &origin);
    response
}

fn apply_cors(response: &mut Response, origin: &HeaderValue) {
    let headers = response.headers_mut();

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

fn allowed_origin(allowed: &[String], request_origin: Option<&HeaderValue>) -> HeaderValue {
    if let Some(origin) = request_origin.and_then(|v| v.to_str().ok()) {
        if allowed.iter().any(|o| o == origin) {
            if let Ok(value) = HeaderValue::from_str(origin) {
                return value;
            }
        }
    }

    allowed
        .first()
        .and_then(|o| HeaderValue::from_str(o).ok())
        .unwrap_or_else(|| HeaderValue::from_static("null"))
}
