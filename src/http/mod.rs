//! HTTP API for the browser front end
//!
//! This module provides the local REST API:
//! - POST /api/recording/start - Start a recording session
//! - POST /api/recording/stop - Stop the current session
//! - GET /api/recording/status - Recording state
//! - GET /api/recording/stats - Pipeline statistics
//! - GET /api/devices - List audio input devices
//! - GET /api/transcriptions[/latest|/recent] - Transcript queries
//! - POST /api/solution[/followup] - Fire-and-forget solution generation
//! - GET /api/solution/status - Poll a submitted result by key
//! - GET /api/solutions - Full keyed result map
//! - POST /api/question/extract - Extract and solve from recent transcript
//! - POST /api/reset - Clear transcript and solution state
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
