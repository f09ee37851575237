use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// A single transcribed chunk of speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Transcribed text.
    pub text: String,

    /// When transcription of this segment completed.
    pub timestamp: DateTime<Utc>,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Shared, append-mostly store of transcript segments for the current
/// session.
///
/// The transcription worker appends while HTTP handlers read, so every
/// accessor takes the lock briefly and clones out. `clear` runs when a new
/// recording starts; segments survive a stop so the transcript stays
/// queryable between sessions.
#[derive(Default)]
pub struct TranscriptStore {
    segments: Mutex<Vec<TranscriptSegment>>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment stamped with the current time, returning a copy.
    pub async fn append(&self, text: impl Into<String>) -> TranscriptSegment {
        let segment = TranscriptSegment::new(text);
        self.segments.lock().await.push(segment.clone());
        segment
    }

    /// Append an already-stamped segment.
    pub async fn append_segment(&self, segment: TranscriptSegment) {
        self.segments.lock().await.push(segment);
    }

    /// All segments in arrival order.
    pub async fn all(&self) -> Vec<TranscriptSegment> {
        self.segments.lock().await.clone()
    }

    /// The most recent segment, if any.
    pub async fn latest(&self) -> Option<TranscriptSegment> {
        self.segments.lock().await.last().cloned()
    }

    /// Segments no older than `window`, in arrival order.
    ///
    /// Comparison is signed, so a segment stamped slightly in the future
    /// (clock skew) still counts as recent rather than panicking or being
    /// silently dropped.
    pub async fn recent(&self, window: Duration) -> Vec<TranscriptSegment> {
        let now = Utc::now();
        self.segments
            .lock()
            .await
            .iter()
            .filter(|s| now.signed_duration_since(s.timestamp) <= window)
            .cloned()
            .collect()
    }

    /// Concatenated text of segments no older than `window`, newline-joined.
    pub async fn recent_text(&self, window: Duration) -> String {
        self.recent(window)
            .await
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub async fn clear(&self) {
        self.segments.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.segments.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.segments.lock().await.is_empty()
    }
}
