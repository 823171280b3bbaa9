//! POST /api/text-to-speech

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::invalid_body;
use crate::{
    error::{ApiError, ApiResult, Credential},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechResponse {
    /// Base64-encoded MP3
    pub audio_content: String,
}

/// POST /api/text-to-speech
pub async fn text_to_speech(
    State(state): State<AppState>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> ApiResult<Json<SpeechResponse>> {
    let Json(request) = payload.map_err(invalid_body)?;

    let text = request
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::InputInvalid("No text provided".to_string()))?;

    let synthesizer = state
        .synthesizer
        .as_ref()
        .ok_or(ApiError::ConfigurationMissing(Credential::SpeechApiKey))?;

    let audio_content = synthesizer.synthesize(&text).await?;
    Ok(Json(SpeechResponse { audio_content }))
}

pub fn speech_routes() -> Router<AppState> {
    Router::new().route("/api/text-to-speech", post(text_to_speech))
}
