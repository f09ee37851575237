use super::handlers;
use super::state::AppState;
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
        // Recording control
        .route("/api/recording/start", post(handlers::start_recording))
        .route("/api/recording/stop", post(handlers::stop_recording))
        .route("/api/recording/status", get(handlers::recording_status))
        .route("/api/recording/stats", get(handlers::recording_stats))
        .route("/api/devices", get(handlers::get_devices))
        // Transcript queries
        .route("/api/transcriptions", get(handlers::get_transcriptions))
        .route(
            "/api/transcriptions/latest",
            get(handlers::latest_transcription),
        )
        .route(
            "/api/transcriptions/recent",
            get(handlers::recent_transcriptions),
        )
        // Solution generation
        .route("/api/solution", post(handlers::submit_solution))
        .route("/api/solution/followup", post(handlers::submit_followup))
        .route("/api/solution/status", get(handlers::solution_status))
        .route("/api/solutions", get(handlers::get_solutions))
        .route("/api/question/extract", post(handlers::extract_question))
        // Maintenance
        .route("/api/reset", post(handlers::reset))
        // Request logging; permissive CORS for the browser front end
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
