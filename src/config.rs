use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub recording: RecordingConfig,
    pub transcription: TranscriptionConfig,
    pub solution: SolutionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device name substring; `None` selects the platform default input.
    pub device: Option<String>,
    /// Input device index (takes precedence over `device` when set).
    pub device_index: Option<usize>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Chunking window handed to the transcription provider.
    pub chunk_seconds: u64,
    /// Frame granularity delivered by the capture source.
    pub frame_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Start a recording session as soon as the service boots.
    pub autostart: bool,
    pub autostart_delay_secs: u64,
    /// Stop automatically after this many seconds; `None` records until stopped.
    pub max_duration_secs: Option<u64>,
    pub transcript_path: String,
    /// Prefix each persisted transcript line with its wall-clock timestamp.
    pub timestamp_lines: bool,
    pub save_audio: bool,
    pub audio_path: String,
    /// Window for `GET /api/transcriptions/recent` when the caller gives none.
    pub recent_window_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Full endpoint URL of an OpenAI-compatible `/audio/transcriptions` API.
    pub base_url: String,
    pub model: String,
    /// Bearer token; falls back to `OPENAI_API_KEY` when unset.
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolutionConfig {
    /// Full endpoint URL of an OpenAI-compatible `/chat/completions` API.
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            audio: AudioConfig::default(),
            recording: RecordingConfig::default(),
            transcription: TranscriptionConfig::default(),
            solution: SolutionConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "wingman".to_string(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5050,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            device_index: None,
            sample_rate: 16000, // Whisper-style STT expects 16kHz
            channels: 1,        // Mono
            chunk_seconds: 5,
            frame_ms: 100,
        }
    }
}

impl AudioConfig {
    pub fn selector(&self) -> crate::audio::DeviceSelector {
        use crate::audio::DeviceSelector;

        if let Some(idx) = self.device_index {
            DeviceSelector::Index(idx)
        } else if let Some(name) = &self.device {
            DeviceSelector::Name(name.clone())
        } else {
            DeviceSelector::Default
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            autostart: false,
            autostart_delay_secs: 2,
            max_duration_secs: None,
            transcript_path: "transcription.txt".to_string(),
            timestamp_lines: false,
            save_audio: false,
            audio_path: "session-audio.wav".to_string(),
            recent_window_secs: 120,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            model: "whisper-1".to_string(),
            api_key: None,
            request_timeout_secs: 30,
        }
    }
}

impl Default for SolutionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            api_key: None,
            request_timeout_secs: 120,
        }
    }
}

impl Config {
    /// Load configuration from an optional file, then apply environment
    /// overrides (`WINGMAN__SECTION__FIELD`, e.g.
    /// `WINGMAN__TRANSCRIPTION__API_KEY`).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("WINGMAN").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
