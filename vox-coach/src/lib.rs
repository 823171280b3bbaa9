//! vox-coach library interface
//!
//! The coaching service: one analysis pipeline per recorded attempt plus
//! the sibling endpoints the wizard calls (text-to-speech, registration,
//! warm-up quiz). Exposed as a library for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod prompt;
pub mod services;

pub use crate::error::{ApiError, ApiResult, CoachingError};

use axum::extract::DefaultBodyLimit;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use vox_common::{Error, Result};

use crate::config::{CoachConfig, DatastoreSettings, DEFAULT_MAX_BODY_BYTES};
use crate::services::{
    CoachingOrchestrator, CoachingStore, FeedbackGenerator, GeminiClient, GoogleSpeechClient,
    GoogleTtsClient, RestCoachingStore, SpeechSynthesizer, SpeechTranscriber, SqliteCoachingStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: CoachingOrchestrator,
    /// `None` when the speech API key is missing
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    /// `None` when no datastore is configured
    pub store: Option<Arc<dyn CoachingStore>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        orchestrator: CoachingOrchestrator,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
        store: Option<Arc<dyn CoachingStore>>,
    ) -> Self {
        Self {
            orchestrator,
            synthesizer,
            store,
            startup_time: Utc::now(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Build the Google clients and datastore described by `config`
    pub async fn from_config(config: &CoachConfig) -> Result<Self> {
        let mut transcriber: Option<Arc<dyn SpeechTranscriber>> = None;
        let mut synthesizer: Option<Arc<dyn SpeechSynthesizer>> = None;

        if let Some(key) = &config.speech_api_key {
            let speech = GoogleSpeechClient::new(
                key.clone(),
                config.recognition_base_url.clone(),
                config.speech_timeout,
                config.retry,
            )
            .map_err(|e| Error::Internal(format!("Speech client: {}", e)))?;
            transcriber = Some(Arc::new(speech));

            let tts = GoogleTtsClient::new(
                key.clone(),
                config.synthesis_base_url.clone(),
                config.speech_timeout,
            )
            .map_err(|e| Error::Internal(format!("Text-to-speech client: {}", e)))?;
            synthesizer = Some(Arc::new(tts));
        }

        let generator: Option<Arc<dyn FeedbackGenerator>> = match &config.generation_api_key {
            Some(key) => {
                let gemini = GeminiClient::new(
                    key.clone(),
                    config.generation_base_url.clone(),
                    Some(config.model.clone()),
                    Some(config.temperature),
                    config.generation_timeout,
                    config.retry,
                )
                .map_err(|e| Error::Internal(format!("Generation client: {}", e)))?;
                tracing::info!(model = gemini.model(), "Generation client ready");
                Some(Arc::new(gemini))
            }
            None => None,
        };

        let store: Option<Arc<dyn CoachingStore>> = match &config.datastore {
            DatastoreSettings::None => None,
            DatastoreSettings::Rest { url, service_key } => Some(Arc::new(
                RestCoachingStore::new(url.clone(), service_key.clone(), config.datastore_timeout)
                    .map_err(|e| Error::Internal(format!("Datastore client: {}", e)))?,
            )),
            DatastoreSettings::Sqlite { path } => Some(Arc::new(
                SqliteCoachingStore::open(path)
                    .await
                    .map_err(|e| Error::Internal(format!("SQLite datastore: {}", e)))?,
            )),
        };

        let orchestrator = CoachingOrchestrator::new(transcriber, generator, store.clone());

        Ok(Self::new(orchestrator, synthesizer, store).with_max_body_bytes(config.max_body_bytes))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .merge(api::analyze_routes())
        .merge(api::speech_routes())
        .merge(api::user_routes())
        .merge(api::warmup_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
