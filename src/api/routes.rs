//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers;
use super::handlers::AppState;

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Message pipeline endpoints
        .route("/messages/sync", post(handlers::sync_message))
        .route("/messages/ask", post(handlers::ask))
        .route("/messages/similar", post(handlers::similar))
        .with_state(state)
}
