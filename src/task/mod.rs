use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::Result;
use crate::provider::SolutionPayload;

/// Lifecycle of one submitted solution request.
///
/// Pollers see `Pending` from the moment submit returns, then exactly one of
/// `Ready` or `Failed`. Absence of a key means it was never submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionState {
    Pending,
    Ready,
    Failed,
}

impl SolutionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolutionState::Pending => "pending",
            SolutionState::Ready => "ready",
            SolutionState::Failed => "failed",
        }
    }
}

/// One keyed result record in the store.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionRecord {
    pub state: SolutionState,

    /// Present when `state` is `Ready`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<SolutionPayload>,

    /// Present when `state` is `Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub submitted_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SolutionRecord {
    fn pending(submitted_at: DateTime<Utc>) -> Self {
        Self {
            state: SolutionState::Pending,
            payload: None,
            error: None,
            submitted_at,
            completed_at: None,
        }
    }

    fn ready(submitted_at: DateTime<Utc>, payload: SolutionPayload) -> Self {
        Self {
            state: SolutionState::Ready,
            payload: Some(payload),
            error: None,
            submitted_at,
            completed_at: Some(Utc::now()),
        }
    }

    fn failed(submitted_at: DateTime<Utc>, error: String) -> Self {
        Self {
            state: SolutionState::Failed,
            payload: None,
            error: Some(error),
            submitted_at,
            completed_at: Some(Utc::now()),
        }
    }
}

/// Shared keyed store of solution results.
///
/// Writes are last-write-wins: resubmitting a key replaces its record.
/// Distinct results for the same artifact (follow-up chains) get their own
/// sub-keys via [`followup_key`] instead of versioned history.
#[derive(Default)]
pub struct ResultStore {
    records: Mutex<HashMap<String, SolutionRecord>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: impl Into<String>, record: SolutionRecord) {
        self.records.lock().await.insert(key.into(), record);
    }

    /// Look up a key. Absent keys return `None`, never an error.
    pub async fn get(&self, key: &str) -> Option<SolutionRecord> {
        self.records.lock().await.get(key).cloned()
    }

    pub async fn all(&self) -> HashMap<String, SolutionRecord> {
        self.records.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.records.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }
}

static FOLLOWUP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Derive a unique sub-key for a follow-up on `base_key`.
///
/// Callers poll the returned key; the base key keeps its original record.
/// The sequence suffix keeps keys distinct even when two follow-ups land in
/// the same millisecond.
pub fn followup_key(base_key: &str) -> String {
    let seq = FOLLOWUP_SEQ.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}:followup:{}-{}",
        base_key,
        Utc::now().timestamp_millis(),
        seq
    )
}

/// Fire-and-forget executor for solution requests.
///
/// `submit` records the key as pending before spawning, so a poll racing the
/// HTTP response still sees the request. The spawned task's outcome then
/// overwrites the record with `Ready` or `Failed`; the caller never gets a
/// channel back.
pub struct TaskRunner {
    store: Arc<ResultStore>,
}

impl TaskRunner {
    pub fn new(store: Arc<ResultStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<ResultStore> {
        Arc::clone(&self.store)
    }

    /// Mark `key` pending and run `work` in the background.
    ///
    /// Returns the task handle so tests can await completion; production
    /// callers drop it.
    pub async fn submit<F>(&self, key: impl Into<String>, work: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<SolutionPayload>> + Send + 'static,
    {
        let key = key.into();
        let submitted_at = Utc::now();

        self.store
            .put(key.clone(), SolutionRecord::pending(submitted_at))
            .await;

        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            match work.await {
                Ok(payload) => {
                    info!("Solution ready for key: {}", key);
                    store
                        .put(key, SolutionRecord::ready(submitted_at, payload))
                        .await;
                }
                Err(e) => {
                    warn!("Solution request failed for key {}: {}", key, e);
                    store
                        .put(key, SolutionRecord::failed(submitted_at, e.to_string()))
                        .await;
                }
            }
        })
    }
}
