//! Test Helper Utilities
//!
//! In-process adapters with call counters, plus request/response plumbing
//! for driving the router with `oneshot`.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use vox_coach::models::AttemptRecord;
use vox_coach::services::{
    CoachingOrchestrator, CoachingStore, FeedbackGenerator, GenerationError, PersistenceError,
    SpeechSynthesizer, SpeechTranscriber, SynthesisError, TranscriptionError,
};
use vox_coach::{build_router, AppState};
use vox_common::api::UserProfile;

/// Small valid base64 payload standing in for a WEBM recording
pub const AUDIO_B64: &str = "GkXfo59ChoEBQveBAULygQRC84EIQoKEd2VibQ==";

// ============================================================================
// Transcriber
// ============================================================================

pub enum TranscriptOutcome {
    Text(String),
    ApiError(u16, String),
}

pub struct MockTranscriber {
    outcome: TranscriptOutcome,
    pub calls: AtomicUsize,
}

impl MockTranscriber {
    pub fn returning(text: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: TranscriptOutcome::Text(text.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(status: u16, message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: TranscriptOutcome::ApiError(status, message.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechTranscriber for MockTranscriber {
    async fn transcribe(&self, _audio_base64: &str) -> Result<String, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            TranscriptOutcome::Text(text) => Ok(text.clone()),
            TranscriptOutcome::ApiError(status, message) => Err(TranscriptionError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

// ============================================================================
// Generator
// ============================================================================

pub struct MockGenerator {
    reply: Result<String, u16>,
    pub calls: AtomicUsize,
    pub last_prompt: Mutex<Option<String>>,
}

impl MockGenerator {
    pub fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(status),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(status) => Err(GenerationError::Api {
                status: *status,
                message: "model unavailable".to_string(),
            }),
        }
    }
}

// ============================================================================
// Datastore
// ============================================================================

#[derive(Default)]
pub struct MockStore {
    pub fail: bool,
    pub attempts: Mutex<Vec<AttemptRecord>>,
    pub users: Mutex<Vec<UserProfile>>,
}

impl MockStore {
    pub fn working() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store whose every write fails like an HTTP 500 from the datastore
    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

#[async_trait]
impl CoachingStore for MockStore {
    fn backend(&self) -> &'static str {
        "mock"
    }

    async fn save_attempt(&self, record: &AttemptRecord) -> Result<(), PersistenceError> {
        if self.fail {
            return Err(PersistenceError::Api {
                status: 500,
                message: "internal datastore error".to_string(),
            });
        }
        self.attempts.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn save_user(&self, user: &UserProfile) -> Result<(), PersistenceError> {
        if self.fail {
            return Err(PersistenceError::Api {
                status: 500,
                message: "internal datastore error".to_string(),
            });
        }
        self.users.lock().unwrap().push(user.clone());
        Ok(())
    }
}

// ============================================================================
// Synthesizer
// ============================================================================

pub struct MockSynthesizer {
    pub fail: bool,
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<String, SynthesisError> {
        if self.fail {
            Err(SynthesisError::Api {
                status: 500,
                message: "Text-to-speech failed".to_string(),
            })
        } else {
            Ok("SUQzBAAAAAAA".to_string())
        }
    }
}

// ============================================================================
// App assembly
// ============================================================================

pub fn app(
    transcriber: Option<Arc<MockTranscriber>>,
    generator: Option<Arc<MockGenerator>>,
    store: Option<Arc<MockStore>>,
) -> Router {
    let transcriber = transcriber.map(|t| t as Arc<dyn SpeechTranscriber>);
    let generator = generator.map(|g| g as Arc<dyn FeedbackGenerator>);
    let store = store.map(|s| s as Arc<dyn CoachingStore>);

    let orchestrator = CoachingOrchestrator::new(transcriber, generator, store.clone());
    let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(MockSynthesizer { fail: false });
    build_router(AppState::new(orchestrator, Some(synthesizer), store))
}

/// Model reply with the given sub-scores and no optional sections
pub fn coaching_reply(clarity: f64, structure: f64, impact: f64) -> Value {
    json!({
        "scores": {
            "clarity": clarity,
            "structure": structure,
            "impact": impact,
            "overall_score": 0
        },
        "spoken_summary": "Good. I can hear what you're trying to say. Lead with what you build, then who it helps.",
        "spoken_intro": "Nice start, Sarah.",
        "what_hearing": {
            "core_identity": "Software engineer",
            "what_they_do": "Builds software",
            "whats_unclear": "Who benefits"
        },
        "what_needs_sharpening": ["Name your audience", "Add a result"],
        "rewritten_version": "I'm Sarah, a software engineer who helps clinics cut paperwork in half.",
        "why_this_works": "Audience and outcome come first.",
        "what_changed": "Added audience and result.",
        "rephrase_options": ["I build tools that give clinicians their evenings back."],
        "next_instruction": "Now say it with a hook."
    })
}

pub fn with_transformation(mut reply: Value) -> Value {
    reply["transformation_summary"] = json!({
        "round_1": "Generic",
        "round_2": "Focused",
        "round_3": "Memorable",
        "breakthrough_moment": "Naming the audience",
        "archetype": "The Practical Builder",
        "what_you_learned": ["Lead with outcome", "Name who you help", "End strong"],
        "spoken_transformation": "You went from generic to memorable."
    });
    reply
}

pub fn attempt_body(duration: u32, attempt: u8, previous: Value) -> Value {
    json!({
        "audioData": AUDIO_B64,
        "duration": duration,
        "attemptNumber": attempt,
        "previousAttempts": previous,
        "userData": { "userId": "user_1700000000000_abc123xyz", "email": "sarah@example.com", "name": "Sarah" }
    })
}

pub async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}
