use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use penny_core::config::TranscriptionConfig;

/// An already-captured audio clip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioSample {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl AudioSample {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self { bytes, content_type }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error("speech could not be understood")]
    Unintelligible,
    #[error("{0}")]
    Service(String),
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, sample: &AudioSample) -> Result<String, TranscriptionError>;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Automatic-speech-recognition adapter. The raw clip is posted as the request
/// body; a blank transcript counts as unintelligible speech.
pub struct HuggingFaceTranscriber {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl HuggingFaceTranscriber {
    pub fn from_config(config: &TranscriptionConfig) -> Result<Self, TranscriptionError> {
        Self::new(&config.base_url, &config.model, config.api_key.clone(), config.timeout_secs)
    }

    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<SecretString>,
        timeout_secs: u64,
    ) -> Result<Self, TranscriptionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                TranscriptionError::Service(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), model.trim_matches('/')),
            api_key,
        })
    }
}

#[async_trait]
impl Transcriber for HuggingFaceTranscriber {
    async fn transcribe(&self, sample: &AudioSample) -> Result<String, TranscriptionError> {
        if sample.bytes.is_empty() {
            return Err(TranscriptionError::Unintelligible);
        }

        let content_type = sample.content_type.as_deref().unwrap_or("application/octet-stream");
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(sample.bytes.clone());
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key.expose_secret());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TranscriptionError::Service("request timed out".to_string())
            } else {
                TranscriptionError::Service(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|parsed| parsed.error)
                .unwrap_or(body);
            return Err(TranscriptionError::Service(format!("HTTP {}: {message}", status.as_u16())));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Service(format!("malformed response: {e}")))?;

        let text = parsed.text.trim();
        if text.is_empty() {
            Err(TranscriptionError::Unintelligible)
        } else {
            Ok(text.to_string())
        }
    }
}
