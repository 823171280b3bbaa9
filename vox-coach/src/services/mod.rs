//! Business logic and outbound service clients

pub mod coaching_orchestrator;
pub mod generation;
pub mod persistence;
pub mod retry;
pub mod synthesis;
pub mod transcription;

pub use coaching_orchestrator::{CoachingOrchestrator, CoachingResponse};
pub use generation::{FeedbackGenerator, GeminiClient, GenerationError};
pub use persistence::{CoachingStore, PersistenceError, RestCoachingStore, SqliteCoachingStore};
pub use retry::RetryPolicy;
pub use synthesis::{GoogleTtsClient, SpeechSynthesizer, SynthesisError};
pub use transcription::{GoogleSpeechClient, SpeechTranscriber, TranscriptionError};

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Extract `error.message` from a Google API error body
pub(crate) fn google_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<GoogleErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .filter(|m| !m.trim().is_empty())
}
