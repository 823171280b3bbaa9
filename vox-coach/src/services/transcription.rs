//! Speech-to-text adapter
//!
//! Sends the base64 recording to the Google Cloud Speech-to-Text
//! `speech:recognize` endpoint with a fixed WEBM/Opus, 48 kHz, en-US
//! configuration and joins the returned transcripts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::retry::{is_transient_status, retry_transient, RetryPolicy, Transient};
use super::google_error_message;

pub const DEFAULT_RECOGNITION_BASE_URL: &str = "https://speech.googleapis.com";
const RECOGNIZE_PATH: &str = "/v1/speech:recognize";

/// Transcription errors
#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Speech API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Transient for TranscriptionError {
    fn is_transient(&self) -> bool {
        match self {
            TranscriptionError::Network(_) => true,
            TranscriptionError::Api { status, .. } => is_transient_status(*status),
            TranscriptionError::Parse(_) => false,
        }
    }
}

/// Speech recognition seam used by the orchestrator
#[async_trait]
pub trait SpeechTranscriber: Send + Sync {
    /// Transcribe base64-encoded audio
    ///
    /// Returns an empty string when the service recognized no speech.
    async fn transcribe(&self, audio_base64: &str) -> Result<String, TranscriptionError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'static str,
    enable_automatic_punctuation: bool,
    model: &'static str,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            encoding: "WEBM_OPUS",
            sample_rate_hertz: 48_000,
            language_code: "en-US",
            enable_automatic_punctuation: true,
            model: "default",
        }
    }
}

#[derive(Debug, Serialize)]
struct RecognitionAudio<'a> {
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig,
    audio: RecognitionAudio<'a>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

/// Join the top alternative of every result with single spaces
fn join_transcripts(response: &RecognizeResponse) -> String {
    response
        .results
        .iter()
        .filter_map(|result| result.alternatives.first())
        .map(|alternative| alternative.transcript.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Google Cloud Speech-to-Text client
pub struct GoogleSpeechClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl GoogleSpeechClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, TranscriptionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(vox_common::config::get_user_agent())
            .timeout(timeout)
            .build()
            .map_err(|e| TranscriptionError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_RECOGNITION_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            retry,
        })
    }

    async fn recognize_once(&self, audio_base64: &str) -> Result<String, TranscriptionError> {
        let body = RecognizeRequest {
            config: RecognitionConfig::default(),
            audio: RecognitionAudio {
                content: audio_base64,
            },
        };

        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, RECOGNIZE_PATH))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscriptionError::Network(e.to_string()))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Speech API responded");

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = google_error_message(&error_text)
                .unwrap_or_else(|| format!("Speech recognition failed: {}", status.as_u16()));
            return Err(TranscriptionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let recognized: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::Parse(e.to_string()))?;

        if recognized.results.is_empty() {
            tracing::warn!("No speech detected in audio");
        }

        Ok(join_transcripts(&recognized))
    }
}

#[async_trait]
impl SpeechTranscriber for GoogleSpeechClient {
    async fn transcribe(&self, audio_base64: &str) -> Result<String, TranscriptionError> {
        let transcript = retry_transient("speech recognition", &self.retry, || {
            self.recognize_once(audio_base64)
        })
        .await?;

        tracing::info!(transcript_chars = transcript.len(), "Transcription complete");
        Ok(transcript)
    }
}
