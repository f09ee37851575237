use std::sync::Arc;

use crate::config::Config;
use crate::provider::SolutionProvider;
use crate::session::SessionManager;
use crate::task::{ResultStore, TaskRunner};
use crate::transcript::TranscriptStore;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Recording session lifecycle
    pub manager: Arc<SessionManager>,

    /// Transcript segments for the current session
    pub transcripts: Arc<TranscriptStore>,

    /// Keyed solution results
    pub results: Arc<ResultStore>,

    /// Fire-and-forget executor that writes into `results`
    pub runner: Arc<TaskRunner>,

    /// LLM collaborator for question extraction and solutions
    pub solver: Arc<dyn SolutionProvider>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        manager: Arc<SessionManager>,
        solver: Arc<dyn SolutionProvider>,
        config: Config,
    ) -> Self {
        let results = Arc::new(ResultStore::new());

        Self {
            transcripts: manager.transcripts(),
            runner: Arc::new(TaskRunner::new(Arc::clone(&results))),
            results,
            manager,
            solver,
            config: Arc::new(config),
        }
    }
}
