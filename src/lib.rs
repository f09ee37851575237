pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod provider;
pub mod session;
pub mod task;
pub mod transcript;

pub use audio::{
    encode_wav, list_input_devices, normalize_frame, write_wav_file, AudioChunk, AudioFrame,
    AudioSource, ChunkBuffer, CpalSource, DeviceSelector, ScriptedSource,
};
pub use config::Config;
pub use error::WingmanError;
pub use http::{create_router, AppState};
pub use provider::{
    parse_solution, HttpSolver, HttpTranscriber, Solution, SolutionPayload, SolutionProvider,
    TranscriptionProvider,
};
pub use session::{
    RecordingSession, SessionConfig, SessionManager, SessionOverrides, SessionStats, StartOutcome,
    StopOutcome,
};
pub use task::{followup_key, ResultStore, SolutionRecord, SolutionState, TaskRunner};
pub use transcript::{TranscriptSegment, TranscriptStore};
