//! Error types for vox-coach
//!
//! [`CoachingError`] classifies every way an analysis can fail;
//! [`ApiError`] turns it (and the sibling endpoints' failures) into the
//! JSON error body `{ error, code, details?, type? }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::models::ReplyError;
use crate::services::{GenerationError, SynthesisError, TranscriptionError};

/// Which credential is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    SpeechApiKey,
    GenerationApiKey,
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::SpeechApiKey => write!(
                f,
                "Speech API key not configured (set VOX_GOOGLE_CLOUD_API_KEY or [speech] api_key)"
            ),
            Credential::GenerationApiKey => write!(
                f,
                "Generation API key not configured (set VOX_GEMINI_API_KEY or [generation] api_key)"
            ),
        }
    }
}

/// Generation stage failure: the service call or its reply
#[derive(Debug, Error)]
pub enum GenerationFailure {
    #[error(transparent)]
    Service(#[from] GenerationError),

    #[error(transparent)]
    InvalidReply(#[from] ReplyError),
}

/// Analysis failure taxonomy
#[derive(Debug, Error)]
pub enum CoachingError {
    #[error("Invalid request: {0}")]
    InputInvalid(String),

    #[error("{0}")]
    ConfigurationMissing(Credential),

    #[error("Speech recognition failed: {0}")]
    TranscriptionFailure(#[from] TranscriptionError),

    #[error("Could not transcribe audio. Please speak clearly.")]
    EmptyTranscript,

    #[error("Coaching feedback generation failed: {0}")]
    GenerationFailure(#[from] GenerationFailure),
}

impl CoachingError {
    pub fn status(&self) -> StatusCode {
        match self {
            CoachingError::InputInvalid(_) => StatusCode::BAD_REQUEST,
            CoachingError::ConfigurationMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
            CoachingError::TranscriptionFailure(_) => StatusCode::BAD_GATEWAY,
            CoachingError::EmptyTranscript => StatusCode::UNPROCESSABLE_ENTITY,
            CoachingError::GenerationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CoachingError::InputInvalid(_) => "INPUT_INVALID",
            CoachingError::ConfigurationMissing(_) => "CONFIGURATION_MISSING",
            CoachingError::TranscriptionFailure(_) => "TRANSCRIPTION_FAILED",
            CoachingError::EmptyTranscript => "EMPTY_TRANSCRIPT",
            CoachingError::GenerationFailure(_) => "GENERATION_FAILED",
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            CoachingError::InputInvalid(msg) => ErrorBody::new(msg.clone(), self.code()),
            CoachingError::ConfigurationMissing(credential) => {
                ErrorBody::new(credential.to_string(), self.code())
            }
            CoachingError::TranscriptionFailure(err) => {
                ErrorBody::new("Speech recognition failed", self.code())
                    .with_details(err.to_string())
                    .with_type("transcription")
            }
            CoachingError::EmptyTranscript => ErrorBody::new(self.to_string(), self.code()),
            CoachingError::GenerationFailure(failure) => {
                let label = match failure {
                    GenerationFailure::Service(_) => "generation",
                    GenerationFailure::InvalidReply(_) => "invalid_reply",
                };
                ErrorBody::new("Coaching feedback generation failed", self.code())
                    .with_details(failure.to_string())
                    .with_type(label)
            }
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

impl ErrorBody {
    fn new(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
            kind: None,
        }
    }

    fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    fn with_type(mut self, kind: &'static str) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Analysis pipeline failure
    #[error(transparent)]
    Coaching(#[from] CoachingError),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    InputInvalid(String),

    /// Missing credential (503)
    #[error("{0}")]
    ConfigurationMissing(Credential),

    /// Request body could not be read, e.g. over the size limit (413)
    #[error("Request body rejected: {message}")]
    BodyRejected { status: StatusCode, message: String },

    /// Text-to-speech service failure (502)
    #[error("Text-to-speech failed: {0}")]
    SynthesisFailed(#[from] SynthesisError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Coaching(err) => {
                let status = err.status();
                if status.is_server_error() {
                    tracing::error!(code = err.code(), error = %err, "Analysis failed");
                } else {
                    tracing::warn!(code = err.code(), error = %err, "Analysis rejected");
                }
                (status, err.body())
            }
            ApiError::InputInvalid(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg, "INPUT_INVALID")),
            ApiError::BodyRejected { status, message } => {
                tracing::warn!(status = status.as_u16(), error = %message, "Request body rejected");
                let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "PAYLOAD_TOO_LARGE"
                } else {
                    "INPUT_INVALID"
                };
                (status, ErrorBody::new(message, code))
            }
            ApiError::ConfigurationMissing(credential) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody::new(credential.to_string(), "CONFIGURATION_MISSING"),
            ),
            ApiError::SynthesisFailed(err) => {
                tracing::error!(error = %err, "Text-to-speech failed");
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody::new("Text-to-speech failed", "SYNTHESIS_FAILED")
                        .with_details(err.to_string())
                        .with_type("synthesis"),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Internal server error", "INTERNAL_ERROR").with_details(msg),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
