use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;

use super::config::SessionConfig;
use super::session::RecordingSession;
use super::stats::SessionStats;
use crate::audio::{AudioSource, CpalSource, DeviceSelector};
use crate::config::Config;
use crate::error::Result;
use crate::provider::TranscriptionProvider;
use crate::transcript::TranscriptStore;

/// Per-start adjustments on top of the configured session defaults.
#[derive(Debug, Clone, Default)]
pub struct SessionOverrides {
    pub device: Option<DeviceSelector>,
    pub chunk_seconds: Option<u64>,
    pub max_duration: Option<Duration>,
}

/// Outcome of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// A session is already recording; the request is a benign no-op.
    AlreadyRecording,
}

/// Outcome of a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    /// Nothing was recording; the request is a benign no-op.
    NotRecording,
}

/// Owns the one active recording session and serializes its lifecycle.
///
/// Start and stop both go through a single lock, so concurrent HTTP calls
/// can never race two sessions onto the same device. A start while recording
/// and a stop while idle are reported as benign outcomes, not errors.
pub struct SessionManager {
    config: Config,
    transcriber: Arc<dyn TranscriptionProvider>,
    transcripts: Arc<TranscriptStore>,
    current: Mutex<Option<Arc<RecordingSession>>>,
}

impl SessionManager {
    pub fn new(
        config: Config,
        transcriber: Arc<dyn TranscriptionProvider>,
        transcripts: Arc<TranscriptStore>,
    ) -> Self {
        Self {
            config,
            transcriber,
            transcripts,
            current: Mutex::new(None),
        }
    }

    pub fn transcripts(&self) -> Arc<TranscriptStore> {
        Arc::clone(&self.transcripts)
    }

    /// Start a session on the configured input device.
    pub async fn start(&self, overrides: SessionOverrides) -> Result<StartOutcome> {
        let selector = overrides
            .device
            .clone()
            .unwrap_or_else(|| self.config.audio.selector());
        let source = Box::new(CpalSource::new(selector));
        self.start_with_source(source, overrides).await
    }

    /// Start a session on an explicit source (tests, prerecorded input).
    pub async fn start_with_source(
        &self,
        source: Box<dyn AudioSource>,
        overrides: SessionOverrides,
    ) -> Result<StartOutcome> {
        let mut current = self.current.lock().await;

        if let Some(existing) = current.as_ref() {
            if existing.is_recording() {
                info!("Start requested while already recording; ignoring");
                return Ok(StartOutcome::AlreadyRecording);
            }
            // Make sure the previous session has fully wound down before its
            // replacement touches the transcript store or the device.
            existing.stop_and_join().await;
        }

        // Each session gets a fresh transcript.
        self.transcripts.clear().await;

        let mut session_config = SessionConfig::from_config(&self.config);
        if let Some(device) = overrides.device {
            session_config.device = device;
        }
        if let Some(chunk_seconds) = overrides.chunk_seconds {
            session_config.chunk_seconds = chunk_seconds;
        }
        if let Some(max_duration) = overrides.max_duration {
            session_config.max_duration = Some(max_duration);
        }

        let session = RecordingSession::start(
            session_config,
            source,
            Arc::clone(&self.transcriber),
            Arc::clone(&self.transcripts),
        )
        .await?;

        *current = Some(session);
        Ok(StartOutcome::Started)
    }

    /// Request stop; the pipeline drains in the background.
    pub async fn stop(&self) -> StopOutcome {
        let current = self.current.lock().await;

        match current.as_ref() {
            Some(session) if session.is_recording() => {
                session.stop().await;
                StopOutcome::Stopped
            }
            _ => {
                info!("Stop requested while not recording; ignoring");
                StopOutcome::NotRecording
            }
        }
    }

    /// Stop and wait for the full drain. Used at process shutdown.
    pub async fn shutdown(&self) {
        let current = self.current.lock().await;
        if let Some(session) = current.as_ref() {
            session.stop_and_join().await;
        }
    }

    pub async fn is_recording(&self) -> bool {
        let current = self.current.lock().await;
        current.as_ref().map(|s| s.is_recording()).unwrap_or(false)
    }

    /// Stats for the current (or most recent) session, if any.
    pub async fn stats(&self) -> Option<SessionStats> {
        let current = self.current.lock().await;
        match current.as_ref() {
            Some(session) => Some(session.stats().await),
            None => None,
        }
    }
}
