use super::handlers;
use super::state::AppState;
use super::ws;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Interview control
        .route("/interviews/start", post(handlers::start_interview))
        .route(
            "/interviews/:session_id/end",
            post(handlers::end_interview),
        )
        // Interview queries
        .route(
            "/interviews/:session_id/status",
            get(handlers::get_status),
        )
        .route(
            "/interviews/:session_id/transcript",
            get(handlers::get_transcript),
        )
        // Per-session duplex transport
        .route("/interviews/:session_id/ws", get(ws::ws_handler))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
