//! Text-to-speech adapter
//!
//! Renders a coaching spoken summary as MP3 audio through the Google Cloud
//! Text-to-Speech `text:synthesize` endpoint. Synthesis is a single call
//! with no retry; the browser falls back to text when it fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::google_error_message;

pub const DEFAULT_SYNTHESIS_BASE_URL: &str = "https://texttospeech.googleapis.com";
const SYNTHESIZE_PATH: &str = "/v1/text:synthesize";

/// Synthesis errors
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Text-to-speech API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Text-to-speech seam used by the `/api/text-to-speech` handler
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`, returning base64-encoded MP3 audio
    async fn synthesize(&self, text: &str) -> Result<String, SynthesisError>;
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection {
    language_code: &'static str,
    name: &'static str,
    ssml_gender: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f64,
    pitch: f64,
    volume_gain_db: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection,
    audio_config: AudioConfig,
}

impl<'a> SynthesizeRequest<'a> {
    /// Mentor voice: en-US Neural2-F, MP3, slightly slowed down
    fn mentor_voice(text: &'a str) -> Self {
        Self {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: "en-US",
                name: "en-US-Neural2-F",
                ssml_gender: "FEMALE",
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                speaking_rate: 0.98,
                pitch: 0.0,
                volume_gain_db: 0.0,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: Option<String>,
}

/// Google Cloud Text-to-Speech client
pub struct GoogleTtsClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleTtsClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SynthesisError> {
        let http_client = reqwest::Client::builder()
            .user_agent(vox_common::config::get_user_agent())
            .timeout(timeout)
            .build()
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_SYNTHESIS_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTtsClient {
    async fn synthesize(&self, text: &str) -> Result<String, SynthesisError> {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, SYNTHESIZE_PATH))
            .query(&[("key", self.api_key.as_str())])
            .json(&SynthesizeRequest::mentor_voice(text))
            .send()
            .await
            .map_err(|e| SynthesisError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %error_text, "Text-to-speech API error");
            let message = google_error_message(&error_text)
                .unwrap_or_else(|| "Text-to-speech failed".to_string());
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let synthesized: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Parse(e.to_string()))?;

        let audio = synthesized
            .audio_content
            .filter(|a| !a.is_empty())
            .ok_or_else(|| SynthesisError::Parse("response has no audioContent".to_string()))?;

        tracing::debug!(text_chars = text.len(), audio_b64_chars = audio.len(), "Speech synthesized");
        Ok(audio)
    }
}
