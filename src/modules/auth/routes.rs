use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn auth_routes(auto_verify_enabled: bool) -> Router<Arc<AppState>> {
    let mut router = Router::new()
        .route("/register", post(controller::register))
        .route("/confirm/{token}", get(controller::confirm))
        .route("/login", post(controller::login))
        .route("/me", get(controller::me));

    // Development bypass for email delivery; not mounted in production.
    if auto_verify_enabled {
        router = router.route("/auto-verify", post(controller::auto_verify));
    }

    router
}
