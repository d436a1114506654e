use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Control channel upgrade
        .route("/ws", get(handlers::ws_upgrade))
        // Transcription records
        .route(
            "/api/transcription",
            post(handlers::submit_transcription)
                .get(handlers::list_transcriptions)
                .fallback(handlers::method_not_allowed),
        )
        // Session control
        .route(
            "/api/toggle",
            post(handlers::toggle_transcription).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/start",
            post(handlers::start_transcription).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/stop",
            post(handlers::stop_transcription).fallback(handlers::method_not_allowed),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
