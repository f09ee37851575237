//! Error types for the capture/transcription pipeline and its collaborators.
//!
//! Transient per-frame stream errors never become values of this type: the
//! capture path logs and skips them. Benign lifecycle conflicts (start while
//! recording, stop while idle) are outcome enums on `SessionManager`, not
//! errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WingmanError {
    // Fatal to session start, surfaced to the caller
    #[error("Audio input device not found: {device}")]
    DeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Per-chunk / per-request: counted and dropped by the workers
    #[error("Transcription provider call failed: {message}")]
    Transcription { message: String },

    #[error("Solution provider call failed: {message}")]
    Solution { message: String },

    // Fails fast at startup with a clear message
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WingmanError>;
