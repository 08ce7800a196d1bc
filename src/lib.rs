pub mod client;
pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::{Config, DbPool};
use modules::auth::auth_routes;
use modules::notes::notes_routes;
use services::cors::cors_headers;
use services::mailer::ConfirmationMailer;
use services::session::SessionService;

pub struct AppState {
    pub db: DbPool,
    pub sessions: SessionService,
    pub mailer: Arc<dyn ConfirmationMailer>,
    pub config: Config,
}

pub async fn create_app(
    db: DbPool,
    sessions: SessionService,
    mailer: Arc<dyn ConfirmationMailer>,
    config: Config,
) -> Router {
    let auto_verify_enabled = config.auto_verify_enabled;

    let state = Arc::new(AppState {
        db,
        sessions,
        mailer,
        config,
    });

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/auth", auth_routes(auto_verify_enabled))
        .nest("/notes", notes_routes())
        .layer(middleware::from_fn_with_state(state.clone(), cors_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> &'static str {
    "Notewall API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
