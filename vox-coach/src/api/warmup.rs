//! Warm-up quiz endpoints

use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use vox_common::warmup::{self, CommunicationStyle, QuizAnswers, QuizQuestion, QUESTIONS};

use super::invalid_body;
use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub questions: &'static [QuizQuestion],
}

/// GET /api/warmup
pub async fn get_quiz() -> Json<QuizResponse> {
    Json(QuizResponse {
        questions: &QUESTIONS,
    })
}

/// POST /api/warmup/result
pub async fn classify_answers(
    payload: Result<Json<QuizAnswers>, JsonRejection>,
) -> ApiResult<Json<CommunicationStyle>> {
    let Json(answers) = payload.map_err(invalid_body)?;

    let style = warmup::classify(&answers).map_err(|e| ApiError::InputInvalid(e.to_string()))?;
    tracing::debug!(style = style.title, "Warm-up quiz classified");
    Ok(Json(style))
}

pub fn warmup_routes() -> Router<AppState> {
    Router::new()
        .route("/api/warmup", get(get_quiz))
        .route("/api/warmup/result", post(classify_answers))
}
