use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::middleware::require_bearer;
use crate::AppState;

/// Allowance for the JSON envelope around uploaded content
const BODY_OVERHEAD: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize + BODY_OVERHEAD;

    // Bearer token required
    let protected = Router::new()
        .route("/api/auth/signout", post(handlers::sign_out))
        .route("/api/files", get(handlers::list_files))
        .route("/api/files/:id", get(handlers::get_file))
        .route("/api/files/:id/result", get(handlers::get_result))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_bearer,
        ));

    // Upload stays public as deployed; only the read side is gated.
    let public = Router::new()
        .route("/api/auth/signup", post(handlers::sign_up))
        .route("/api/auth/confirm", post(handlers::confirm_sign_up))
        .route("/api/auth/signin", post(handlers::sign_in))
        .route(
            "/api/files",
            post(handlers::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/_internal/health", get(handlers::health));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
