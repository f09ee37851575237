pub mod solution;
pub mod transcription;

pub use solution::{parse_solution, HttpSolver, Solution, SolutionPayload, SolutionProvider};
pub use transcription::{HttpTranscriber, TranscriptionProvider};

use crate::error::{Result, WingmanError};

/// Clamp provider error bodies to something log-friendly.
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Resolve an API key from config, falling back to `OPENAI_API_KEY`.
pub(crate) fn resolve_api_key(configured: Option<&str>, config_field: &str) -> Result<String> {
    if let Some(key) = configured {
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }

    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(WingmanError::Configuration {
            message: format!(
                "No API key configured: set {} or the OPENAI_API_KEY environment variable",
                config_field
            ),
        }),
    }
}
