use std::path::PathBuf;
use std::time::Duration;

use crate::audio::DeviceSelector;
use crate::config::Config;

/// Configuration for a single recording session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "interview-3fa85f64-...")
    pub session_id: String,

    /// Which input device to capture from
    pub device: DeviceSelector,

    /// Sample rate for transcription audio (Whisper expects 16kHz)
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Duration of each transcription chunk
    pub chunk_seconds: u64,

    /// Stop automatically after this long, if set
    pub max_duration: Option<Duration>,

    /// Transcript lines are appended here as they arrive
    pub transcript_path: PathBuf,

    /// Prefix each transcript line with a [HH:MM:SS] timestamp
    pub timestamp_lines: bool,

    /// Keep the full session audio and write it out as WAV on stop
    pub save_audio: bool,

    /// Where the session WAV goes when `save_audio` is set
    pub audio_path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("interview-{}", uuid::Uuid::new_v4()),
            device: DeviceSelector::Default,
            sample_rate: 16000, // Whisper expects 16kHz
            channels: 1,        // Mono
            chunk_seconds: 5,
            max_duration: None,
            transcript_path: PathBuf::from("transcription.txt"),
            timestamp_lines: false,
            save_audio: false,
            audio_path: PathBuf::from("session-audio.wav"),
        }
    }
}

impl SessionConfig {
    /// Derive a fresh session config (new session id) from the app config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            session_id: format!("interview-{}", uuid::Uuid::new_v4()),
            device: config.audio.selector(),
            sample_rate: config.audio.sample_rate,
            channels: config.audio.channels,
            chunk_seconds: config.audio.chunk_seconds,
            max_duration: config.recording.max_duration_secs.map(Duration::from_secs),
            transcript_path: PathBuf::from(&config.recording.transcript_path),
            timestamp_lines: config.recording.timestamp_lines,
            save_audio: config.recording.save_audio,
            audio_path: PathBuf::from(&config.recording.audio_path),
        }
    }
}
