//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when a required credential is missing
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub speech_configured: bool,
    pub generation_configured: bool,
    /// Datastore backend label ("rest", "sqlite" or "none")
    pub datastore: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let speech_configured = state.orchestrator.has_transcriber();
    let generation_configured = state.orchestrator.has_generator();

    let status = if speech_configured && generation_configured {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        module: "vox-coach".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        speech_configured,
        generation_configured,
        datastore: state
            .store
            .as_ref()
            .map(|s| s.backend())
            .unwrap_or("none")
            .to_string(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
