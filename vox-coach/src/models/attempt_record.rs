//! Persisted attempt record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vox_common::api::AttemptRequest;

use super::CoachingResult;

/// Row written to the `attempts` table
///
/// `scores` and `coaching_data` hold JSON text so the same row shape works
/// for both the REST and SQLite datastores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub user_id: Option<String>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    /// Duration category in seconds
    pub duration: u32,
    pub attempt_number: u8,
    pub transcript: String,
    pub scores: String,
    pub coaching_data: String,
    pub created_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn from_analysis(
        request: &AttemptRequest,
        transcript: &str,
        coaching: &CoachingResult,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            user_id: request.user_data.user_id.clone(),
            user_email: request.user_data.email.clone(),
            user_name: request.user_data.name.clone(),
            duration: request.duration.seconds(),
            attempt_number: request.attempt_number.get(),
            transcript: transcript.to_string(),
            scores: serde_json::to_string(&coaching.scores)?,
            coaching_data: serde_json::to_string(coaching)?,
            created_at: Utc::now(),
        })
    }
}
