use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;

use crate::config::TranscriptionConfig;
use crate::error::{Result, WingmanError};
use crate::provider::{resolve_api_key, truncate};

/// Speech-to-text collaborator.
///
/// Takes one WAV-encoded chunk and returns whatever text the model heard.
/// Implementations must be callable concurrently.
#[async_trait::async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn transcribe(&self, wav_bytes: Vec<u8>) -> Result<String>;

    /// Provider name for logging.
    fn name(&self) -> String;
}

/// OpenAI-compatible `/audio/transcriptions` client.
///
/// Uploads each chunk as a multipart WAV and expects a `{"text": ...}` JSON
/// body back. Works against the hosted API or any local server that speaks
/// the same protocol.
pub struct HttpTranscriber {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl HttpTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let api_key = resolve_api_key(config.api_key.as_deref(), "transcription.api_key")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| WingmanError::Transcription {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[derive(Deserialize)]
struct TranscribeResponse {
    text: String,
}

#[async_trait::async_trait]
impl TranscriptionProvider for HttpTranscriber {
    async fn transcribe(&self, wav_bytes: Vec<u8>) -> Result<String> {
        let byte_count = wav_bytes.len();

        let part = Part::bytes(wav_bytes)
            .file_name("chunk.wav")
            .mime_str("audio/wav")
            .map_err(|e| WingmanError::Transcription {
                message: format!("Failed to build multipart body: {}", e),
            })?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "json");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| WingmanError::Transcription {
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WingmanError::Transcription {
                message: format!("Provider returned {}: {}", status, truncate(&body, 200)),
            });
        }

        let parsed: TranscribeResponse =
            response
                .json()
                .await
                .map_err(|e| WingmanError::Transcription {
                    message: format!("Malformed provider response: {}", e),
                })?;

        debug!(
            "Transcribed {} byte chunk into {} chars",
            byte_count,
            parsed.text.len()
        );

        Ok(parsed.text.trim().to_string())
    }

    fn name(&self) -> String {
        format!("{} ({})", self.model, self.base_url)
    }
}
