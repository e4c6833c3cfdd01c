//! Router configuration for the web server.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/reanalyze", post(handlers::reanalyze))
        .route("/healthz", get(handlers::healthz))
        // The tower-http limit replaces axum's 2 MB extractor default.
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
