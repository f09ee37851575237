//! Recording session management
//!
//! This module provides the `RecordingSession` pipeline and the
//! `SessionManager` that owns it:
//! - Audio capture from the configured input device
//! - Frame normalization (downsampling, mono conversion) and chunking
//! - Chunk-by-chunk transcription into the shared transcript store
//! - Transcript persistence and session WAV export
//! - Session statistics and lifecycle state

mod config;
mod manager;
mod session;
mod stats;

pub use config::SessionConfig;
pub use manager::{SessionManager, SessionOverrides, StartOutcome, StopOutcome};
pub use session::RecordingSession;
pub use stats::{PipelineCounters, SessionStats};
