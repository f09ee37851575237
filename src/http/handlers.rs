use super::state::AppState;
use crate::audio::{list_input_devices, DeviceSelector};
use crate::error::WingmanError;
use crate::provider::SolutionPayload;
use crate::session::{SessionOverrides, StartOutcome, StopOutcome};
use crate::task::followup_key;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartRecordingRequest {
    /// Input device name substring (default: configured device)
    pub device: Option<String>,

    /// Chunk duration in seconds (default: configured, normally 5)
    pub chunk_seconds: Option<u64>,

    /// Stop automatically after this many seconds
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct RecordingStatusResponse {
    pub is_recording: bool,
    pub transcript_segments: usize,
}

#[derive(Debug, Serialize)]
pub struct DevicesResponse {
    pub devices: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LatestTranscriptionResponse {
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    /// Window in seconds (default: configured recent window)
    pub window_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SolutionRequest {
    pub question: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FollowupRequest {
    /// Key of the original solution this follow-up belongs to
    pub key: Option<String>,
    pub problem: Option<String>,
    pub code: Option<String>,
    /// Explicit transcript context; defaults to the recent window
    pub transcript: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExtractQuestionRequest {
    pub key: Option<String>,
    pub window_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SubmittedResponse {
    pub status: String,
    /// Key to poll on `/api/solution/status`
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SolutionStatusResponse {
    pub key: String,
    /// pending | ready | failed | unknown
    pub state: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<SolutionPayload>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    (
        code,
        Json(ErrorResponse {
            status: "error".to_string(),
            message: message.into(),
        }),
    )
        .into_response()
}

fn bad_request(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

// ============================================================================
// Recording Handlers
// ============================================================================

/// POST /api/recording/start
/// Start a recording session (body optional)
pub async fn start_recording(
    State(state): State<AppState>,
    body: Option<Json<StartRecordingRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let overrides = SessionOverrides {
        device: req.device.map(DeviceSelector::Name),
        chunk_seconds: req.chunk_seconds,
        max_duration: req.duration_secs.map(Duration::from_secs),
    };

    match state.manager.start(overrides).await {
        Ok(StartOutcome::Started) => (
            StatusCode::OK,
            Json(StatusResponse {
                status: "recording_started".to_string(),
            }),
        )
            .into_response(),
        Ok(StartOutcome::AlreadyRecording) => (
            StatusCode::OK,
            Json(StatusResponse {
                status: "already_recording".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start recording: {}", e);
            let code = match e {
                WingmanError::DeviceNotFound { .. } => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            error_response(code, format!("Failed to start recording: {}", e))
        }
    }
}

/// POST /api/recording/stop
/// Stop the current session; the pipeline drains in the background
pub async fn stop_recording(State(state): State<AppState>) -> impl IntoResponse {
    let status = match state.manager.stop().await {
        StopOutcome::Stopped => "recording_stopped",
        StopOutcome::NotRecording => "not_recording",
    };

    (
        StatusCode::OK,
        Json(StatusResponse {
            status: status.to_string(),
        }),
    )
}

/// GET /api/recording/status
pub async fn recording_status(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(RecordingStatusResponse {
            is_recording: state.manager.is_recording().await,
            transcript_segments: state.transcripts.len().await,
        }),
    )
}

/// GET /api/recording/stats
/// Pipeline statistics for the current (or most recent) session
pub async fn recording_stats(State(state): State<AppState>) -> impl IntoResponse {
    match state.manager.stats().await {
        Some(stats) => (StatusCode::OK, Json(stats)).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "No recording session yet"),
    }
}

/// GET /api/devices
/// List available audio input devices
pub async fn get_devices() -> impl IntoResponse {
    match list_input_devices() {
        Ok(devices) => (StatusCode::OK, Json(DevicesResponse { devices })).into_response(),
        Err(e) => {
            error!("Failed to enumerate devices: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to enumerate devices: {}", e),
            )
        }
    }
}

// ============================================================================
// Transcript Handlers
// ============================================================================

/// GET /api/transcriptions
/// All transcript segments for the current session
pub async fn get_transcriptions(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.transcripts.all().await))
}

/// GET /api/transcriptions/latest
pub async fn latest_transcription(State(state): State<AppState>) -> impl IntoResponse {
    let latest = state.transcripts.latest().await;

    let response = match latest {
        Some(segment) => LatestTranscriptionResponse {
            text: segment.text,
            timestamp: Some(segment.timestamp),
        },
        None => LatestTranscriptionResponse {
            text: String::new(),
            timestamp: None,
        },
    };

    (StatusCode::OK, Json(response))
}

/// GET /api/transcriptions/recent?window_secs=N
pub async fn recent_transcriptions(
    State(state): State<AppState>,
    Query(query): Query<RecentQuery>,
) -> impl IntoResponse {
    let window_secs = query
        .window_secs
        .unwrap_or(state.config.recording.recent_window_secs);
    let window = chrono::Duration::seconds(window_secs as i64);

    (StatusCode::OK, Json(state.transcripts.recent(window).await))
}

// ============================================================================
// Solution Handlers
// ============================================================================

/// POST /api/solution
/// Fire-and-forget solution generation; poll /api/solution/status for the
/// result
pub async fn submit_solution(
    State(state): State<AppState>,
    Json(req): Json<SolutionRequest>,
) -> impl IntoResponse {
    let Some(question) = req.question.filter(|q| !q.trim().is_empty()) else {
        return bad_request("Missing required parameter: question");
    };
    let Some(key) = req.key.filter(|k| !k.trim().is_empty()) else {
        return bad_request("Missing required parameter: key");
    };

    info!("Solution requested for key: {}", key);

    let window = chrono::Duration::seconds(state.config.recording.recent_window_secs as i64);
    let transcript = state.transcripts.recent_text(window).await;

    let solver = Arc::clone(&state.solver);
    state
        .runner
        .submit(key.clone(), async move {
            solver.solve(&question, &transcript).await
        })
        .await;

    (
        StatusCode::ACCEPTED,
        Json(SubmittedResponse {
            status: "submitted".to_string(),
            key,
        }),
    )
        .into_response()
}

/// POST /api/solution/followup
/// Follow-up on an earlier solution; the result lands under a derived
/// sub-key returned in the response
pub async fn submit_followup(
    State(state): State<AppState>,
    Json(req): Json<FollowupRequest>,
) -> impl IntoResponse {
    let Some(key) = req.key.filter(|k| !k.trim().is_empty()) else {
        return bad_request("Missing required parameter: key");
    };
    let Some(problem) = req.problem.filter(|p| !p.trim().is_empty()) else {
        return bad_request("Missing required parameter: problem");
    };

    let code = req.code.unwrap_or_default();
    let transcript = match req.transcript {
        Some(t) => t,
        None => {
            let window =
                chrono::Duration::seconds(state.config.recording.recent_window_secs as i64);
            state.transcripts.recent_text(window).await
        }
    };

    let sub_key = followup_key(&key);
    info!("Follow-up requested for key: {} -> {}", key, sub_key);

    let solver = Arc::clone(&state.solver);
    state
        .runner
        .submit(sub_key.clone(), async move {
            solver.follow_up(&problem, &code, &transcript).await
        })
        .await;

    (
        StatusCode::ACCEPTED,
        Json(SubmittedResponse {
            status: "submitted".to_string(),
            key: sub_key,
        }),
    )
        .into_response()
}

/// GET /api/solution/status?key=K
/// Poll for a submitted result; unknown keys report state "unknown"
pub async fn solution_status(
    State(state): State<AppState>,
    Query(query): Query<KeyQuery>,
) -> impl IntoResponse {
    let Some(key) = query.key.filter(|k| !k.trim().is_empty()) else {
        return bad_request("Missing required parameter: key");
    };

    let response = match state.results.get(&key).await {
        Some(record) => SolutionStatusResponse {
            key,
            state: record.state.as_str().to_string(),
            solution: record.payload,
            error: record.error,
        },
        None => SolutionStatusResponse {
            key,
            state: "unknown".to_string(),
            solution: None,
            error: None,
        },
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// GET /api/solutions
/// Full keyed result map
pub async fn get_solutions(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.results.all().await))
}

/// POST /api/question/extract
/// Extract the question from the recent transcript window and solve it,
/// storing the result under the given key
pub async fn extract_question(
    State(state): State<AppState>,
    Json(req): Json<ExtractQuestionRequest>,
) -> impl IntoResponse {
    let Some(key) = req.key.filter(|k| !k.trim().is_empty()) else {
        return bad_request("Missing required parameter: key");
    };

    let window_secs = req
        .window_secs
        .unwrap_or(state.config.recording.recent_window_secs);
    let window = chrono::Duration::seconds(window_secs as i64);
    let transcript = state.transcripts.recent_text(window).await;

    if transcript.is_empty() {
        return bad_request("No recent transcript to extract a question from");
    }

    info!("Question extraction requested for key: {}", key);

    let solver = Arc::clone(&state.solver);
    state
        .runner
        .submit(key.clone(), async move {
            let question = solver.extract_question(&transcript).await?;
            solver.solve(&question, &transcript).await
        })
        .await;

    (
        StatusCode::ACCEPTED,
        Json(SubmittedResponse {
            status: "submitted".to_string(),
            key,
        }),
    )
        .into_response()
}

/// POST /api/reset
/// Clear the transcript store and all solution results
pub async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    state.transcripts.clear().await;
    state.results.clear().await;

    info!("Transcript and solution state cleared");

    (
        StatusCode::OK,
        Json(StatusResponse {
            status: "reset".to_string(),
        }),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
