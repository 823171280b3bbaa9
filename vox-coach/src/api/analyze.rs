//! POST /api/analyze

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use vox_common::api::AttemptRequest;

use super::invalid_body;
use crate::{error::ApiResult, services::CoachingResponse, AppState};

/// POST /api/analyze
///
/// Transcribe one recorded attempt and return coaching feedback.
pub async fn analyze_attempt(
    State(state): State<AppState>,
    payload: Result<Json<AttemptRequest>, JsonRejection>,
) -> ApiResult<Json<CoachingResponse>> {
    let Json(request) = payload.map_err(invalid_body)?;

    let response = state.orchestrator.analyze(request).await?;
    Ok(Json(response))
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/api/analyze", post(analyze_attempt))
}
