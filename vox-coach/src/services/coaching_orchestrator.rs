//! Coaching orchestrator
//!
//! Runs one attempt through transcription, feedback generation, optional
//! persistence and response assembly. Data flows strictly forward and the
//! first hard error aborts the run. Persistence failures are logged and
//! never change the response.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vox_common::api::AttemptRequest;

use super::generation::FeedbackGenerator;
use super::persistence::CoachingStore;
use super::transcription::SpeechTranscriber;
use crate::error::{CoachingError, Credential, GenerationFailure};
use crate::models::{finalize, parse_coaching_reply, AnalysisRun, AnalysisState, AttemptRecord, CoachingResult};
use crate::prompt::{build_prompt, PromptInput};

/// Successful analysis payload: the transcript merged with the coaching fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingResponse {
    pub transcript: String,
    #[serde(flatten)]
    pub coaching: CoachingResult,
}

/// Per-attempt analysis pipeline
///
/// Adapters are optional: a missing speech or generation adapter means the
/// matching credential is not configured, which is reported per request.
#[derive(Clone, Default)]
pub struct CoachingOrchestrator {
    transcriber: Option<Arc<dyn SpeechTranscriber>>,
    generator: Option<Arc<dyn FeedbackGenerator>>,
    store: Option<Arc<dyn CoachingStore>>,
}

impl CoachingOrchestrator {
    pub fn new(
        transcriber: Option<Arc<dyn SpeechTranscriber>>,
        generator: Option<Arc<dyn FeedbackGenerator>>,
        store: Option<Arc<dyn CoachingStore>>,
    ) -> Self {
        Self {
            transcriber,
            generator,
            store,
        }
    }

    pub fn has_transcriber(&self) -> bool {
        self.transcriber.is_some()
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Analyze one attempt
    pub async fn analyze(&self, request: AttemptRequest) -> Result<CoachingResponse, CoachingError> {
        let mut run = AnalysisRun::new();
        let outcome = self.analyze_tracked(&request, &mut run).await;

        tracing::debug!(
            run_id = %run.run_id,
            final_state = ?run.state,
            elapsed_ms = run.elapsed_ms(),
            "Analysis finished"
        );
        outcome
    }

    /// Analyze one attempt, recording every state transition on `run`
    pub async fn analyze_tracked(
        &self,
        request: &AttemptRequest,
        run: &mut AnalysisRun,
    ) -> Result<CoachingResponse, CoachingError> {
        tracing::info!(
            run_id = %run.run_id,
            duration = request.duration.seconds(),
            attempt_number = request.attempt_number.get(),
            previous_attempts = request.previous_attempts.len(),
            "Analyzing attempt"
        );

        // RECEIVED: input and credentials
        let prepared = validate_audio(request)
            .and_then(|audio| Ok((audio, self.require_adapters()?)));
        let (audio, (transcriber, generator)) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                run.transition_to(AnalysisState::Rejected);
                return Err(err);
            }
        };

        // TRANSCRIBING
        run.transition_to(AnalysisState::Transcribing);
        let transcript = match transcriber.transcribe(audio).await {
            Ok(transcript) => transcript,
            Err(err) => {
                run.transition_to(AnalysisState::Error);
                return Err(CoachingError::TranscriptionFailure(err));
            }
        };
        run.transition_to(AnalysisState::Transcribed);

        let transcript = transcript.trim().to_string();
        if transcript.is_empty() {
            run.transition_to(AnalysisState::Rejected);
            return Err(CoachingError::EmptyTranscript);
        }
        tracing::debug!(transcript_chars = transcript.len(), "Transcript ready");

        // GENERATING
        run.transition_to(AnalysisState::Generating);
        let coaching = match self.generate_feedback(generator, request, &transcript).await {
            Ok(coaching) => coaching,
            Err(failure) => {
                run.transition_to(AnalysisState::Error);
                return Err(CoachingError::GenerationFailure(failure));
            }
        };
        run.transition_to(AnalysisState::Generated);
        tracing::info!(
            overall_score = coaching.scores.overall_score,
            has_improvement = coaching.improvement.is_some(),
            "Coaching feedback generated"
        );

        // PERSISTING (optional)
        if let Some(store) = &self.store {
            run.transition_to(AnalysisState::Persisting);
            persist_attempt(store.as_ref(), request, &transcript, &coaching).await;
        }

        run.transition_to(AnalysisState::Responding);
        let response = CoachingResponse {
            transcript,
            coaching,
        };
        run.transition_to(AnalysisState::Done);

        Ok(response)
    }

    fn require_adapters(
        &self,
    ) -> Result<(&dyn SpeechTranscriber, &dyn FeedbackGenerator), CoachingError> {
        let transcriber = self
            .transcriber
            .as_deref()
            .ok_or(CoachingError::ConfigurationMissing(Credential::SpeechApiKey))?;
        let generator = self
            .generator
            .as_deref()
            .ok_or(CoachingError::ConfigurationMissing(Credential::GenerationApiKey))?;
        Ok((transcriber, generator))
    }

    async fn generate_feedback(
        &self,
        generator: &dyn FeedbackGenerator,
        request: &AttemptRequest,
        transcript: &str,
    ) -> Result<CoachingResult, GenerationFailure> {
        let prompt = build_prompt(&PromptInput {
            transcript,
            duration: request.duration,
            attempt: request.attempt_number,
            previous_attempts: &request.previous_attempts,
        });

        let reply = generator.generate(&prompt).await?;
        let feedback = parse_coaching_reply(&reply)?;
        Ok(finalize(feedback, request.attempt_number, request.previous_scores())?)
    }
}

/// Audio must be present, non-empty and valid base64
fn validate_audio(request: &AttemptRequest) -> Result<&str, CoachingError> {
    let audio = request
        .audio_data
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| CoachingError::InputInvalid("No audio data provided".to_string()))?;

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(audio)
        .map_err(|e| CoachingError::InputInvalid(format!("audioData is not valid base64: {}", e)))?;

    if decoded.is_empty() {
        return Err(CoachingError::InputInvalid("Audio data is empty".to_string()));
    }

    tracing::debug!(audio_bytes = decoded.len(), "Audio accepted");
    Ok(audio)
}

async fn persist_attempt(
    store: &dyn CoachingStore,
    request: &AttemptRequest,
    transcript: &str,
    coaching: &CoachingResult,
) {
    let record = match AttemptRecord::from_analysis(request, transcript, coaching) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build attempt record, not persisted");
            return;
        }
    };

    match store.save_attempt(&record).await {
        Ok(()) => tracing::debug!(backend = store.backend(), "Attempt persisted"),
        Err(e) => tracing::warn!(backend = store.backend(), error = %e, "Failed to persist attempt"),
    }
}
