//! Feedback generation adapter
//!
//! Calls the Gemini `generateContent` endpoint in JSON output mode and
//! returns the raw reply text. Turning that text into a validated
//! [`CoachingResult`](crate::models::CoachingResult) is the job of
//! [`parse_coaching_reply`](crate::models::parse_coaching_reply); the model
//! output is treated as untrusted.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::google_error_message;
use super::retry::{is_transient_status, retry_transient, RetryPolicy, Transient};

pub const DEFAULT_GENERATION_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f64 = 0.85;

/// Generation errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Generation API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Model returned no text{}", .0.as_deref().map(|r| format!(" (blocked: {})", r)).unwrap_or_default())]
    EmptyReply(Option<String>),
}

impl Transient for GenerationError {
    fn is_transient(&self) -> bool {
        match self {
            GenerationError::Network(_) => true,
            GenerationError::Api { status, .. } => is_transient_status(*status),
            GenerationError::Parse(_) | GenerationError::EmptyReply(_) => false,
        }
    }
}

/// Generative-text seam used by the orchestrator
#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    /// Generate a reply for `prompt`, expected to be a JSON document
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    response_mime_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Concatenated text parts of the first candidate
fn reply_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);
        return Err(GenerationError::EmptyReply(block_reason));
    }
    Ok(text)
}

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f64,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        model: Option<String>,
        temperature: Option<f64>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(vox_common::config::get_user_agent())
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_GENERATION_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: temperature.unwrap_or(DEFAULT_TEMPERATURE),
            retry,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate_once(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json",
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http_client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), model = %self.model, "Generation API responded");

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = google_error_message(&error_text)
                .unwrap_or_else(|| format!("AI analysis failed: {}", status.as_u16()));
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let generated: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        reply_text(generated)
    }
}

#[async_trait]
impl FeedbackGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        tracing::debug!(prompt_chars = prompt.len(), "Requesting coaching feedback");

        let reply = retry_transient("feedback generation", &self.retry, || {
            self.generate_once(prompt)
        })
        .await?;

        let preview: String = reply.chars().take(200).collect();
        tracing::debug!(reply_chars = reply.len(), preview = %preview, "Generation reply received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reply_text_joins_parts_of_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }], "role": "model" } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();

        assert_eq!(reply_text(response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_blocked_prompt_is_empty_reply() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();

        match reply_text(response) {
            Err(GenerationError::EmptyReply(reason)) => assert_eq!(reason.as_deref(), Some("SAFETY")),
            other => panic!("expected EmptyReply, got {:?}", other),
        }
    }

    #[test]
    fn test_request_uses_json_output_mode() {
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![TextPart { text: "hello" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.85,
                response_mime_type: "application/json",
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["generationConfig"]["temperature"], 0.85);
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_empty_reply_message() {
        assert_eq!(GenerationError::EmptyReply(None).to_string(), "Model returned no text");
        assert_eq!(
            GenerationError::EmptyReply(Some("SAFETY".into())).to_string(),
            "Model returned no text (blocked: SAFETY)"
        );
    }
}
