use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether recording is currently active
    pub is_recording: bool,

    /// When the recording started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds (frozen once the session stops)
    pub duration_secs: f64,

    /// Chunks successfully transcribed
    pub chunks_transcribed: u64,

    /// Chunks dropped because the provider call failed
    pub chunks_failed: u64,

    /// Frames dropped because the capture channel backed up
    pub frames_dropped: u64,

    /// Transcript segments collected so far
    pub transcript_segments: usize,
}

/// Atomic counters shared by the pipeline workers.
///
/// Dropped chunks and frames are deliberate lossy-streaming policy; these
/// counters are what makes that loss observable instead of silent.
#[derive(Debug, Default)]
pub struct PipelineCounters {
    pub chunks_transcribed: AtomicU64,
    pub chunks_failed: AtomicU64,
    pub frames_dropped: AtomicU64,
}

impl PipelineCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks_transcribed(&self) -> u64 {
        self.chunks_transcribed.load(Ordering::Relaxed)
    }

    pub fn chunks_failed(&self) -> u64 {
        self.chunks_failed.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }
}
