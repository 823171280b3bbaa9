//! POST /api/save-user
//!
//! Registration is best-effort: the wizard continues whatever this
//! endpoint answers, so a missing datastore is reported as a plain 200.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use vox_common::api::UserProfile;

use super::invalid_body;
use crate::{error::ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct SaveUserResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/save-user
pub async fn save_user(
    State(state): State<AppState>,
    payload: Result<Json<UserProfile>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaveUserResponse>)> {
    let Json(user) = payload.map_err(invalid_body)?;

    tracing::info!(user_id = %user.user_id, role = %user.role, "Saving user");

    let Some(store) = state.store.as_ref() else {
        tracing::info!("Datastore not configured, skipping user save");
        return Ok((
            StatusCode::OK,
            Json(SaveUserResponse {
                success: false,
                message: Some("Datastore not configured".to_string()),
                error: None,
            }),
        ));
    };

    match store.save_user(&user).await {
        Ok(()) => {
            tracing::info!(backend = store.backend(), "User saved");
            Ok((
                StatusCode::OK,
                Json(SaveUserResponse {
                    success: true,
                    message: None,
                    error: None,
                }),
            ))
        }
        Err(e) => {
            tracing::error!(backend = store.backend(), error = %e, "Failed to save user");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SaveUserResponse {
                    success: false,
                    message: None,
                    error: Some(e.to_string()),
                }),
            ))
        }
    }
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/api/save-user", post(save_user))
}
