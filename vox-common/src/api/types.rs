//! Shared API request/response types
//!
//! Types exchanged between the browser wizard (see [`crate::session`]) and
//! the coaching service.
//!
//! # Wire format
//!
//! The browser speaks camelCase for request fields (`audioData`,
//! `attemptNumber`, ...) while coaching results use snake_case keys, which
//! is what the generation service is asked to emit.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scores::ScoreCard;

// ========================================
// Duration Categories
// ========================================

/// Time budget assigned to an attempt
///
/// Serialized as the number of seconds (15, 30 or 60).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum DurationCategory {
    /// 15-second introduction
    Short,
    /// 30-second introduction
    Medium,
    /// 60-second introduction
    Long,
}

impl DurationCategory {
    /// All categories in unlock order
    pub const ALL: [DurationCategory; 3] = [Self::Short, Self::Medium, Self::Long];

    pub fn seconds(self) -> u32 {
        match self {
            Self::Short => 15,
            Self::Medium => 30,
            Self::Long => 60,
        }
    }

    pub fn from_seconds(seconds: u32) -> Option<Self> {
        match seconds {
            15 => Some(Self::Short),
            30 => Some(Self::Medium),
            60 => Some(Self::Long),
            _ => None,
        }
    }

    /// Category that must be completed before this one unlocks
    pub fn prerequisite(self) -> Option<Self> {
        match self {
            Self::Short => None,
            Self::Medium => Some(Self::Short),
            Self::Long => Some(Self::Medium),
        }
    }
}

impl TryFrom<u32> for DurationCategory {
    type Error = String;

    fn try_from(seconds: u32) -> Result<Self, Self::Error> {
        Self::from_seconds(seconds).ok_or_else(|| {
            format!("unsupported duration {}s (expected 15, 30 or 60)", seconds)
        })
    }
}

impl From<DurationCategory> for u32 {
    fn from(duration: DurationCategory) -> Self {
        duration.seconds()
    }
}

impl fmt::Display for DurationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds())
    }
}

// ========================================
// Attempt Numbers
// ========================================

/// Round within a three-round session (1, 2 or 3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AttemptNumber(u8);

impl AttemptNumber {
    pub const FIRST: AttemptNumber = AttemptNumber(1);
    pub const FINAL: AttemptNumber = AttemptNumber(3);

    pub fn new(value: u8) -> Option<Self> {
        (1..=Self::FINAL.0).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_first(self) -> bool {
        self == Self::FIRST
    }

    pub fn is_final(self) -> bool {
        self == Self::FINAL
    }

    /// Following round, `None` after the final round
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }
}

impl TryFrom<u8> for AttemptNumber {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("attempt number must be 1, 2 or 3, got {}", value))
    }
}

impl From<AttemptNumber> for u8 {
    fn from(attempt: AttemptNumber) -> Self {
        attempt.0
    }
}

impl fmt::Display for AttemptNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ========================================
// Attempt Submission
// ========================================

/// Caller identity attached to an attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Summary of an earlier attempt in the same session
///
/// Browsers send the whole previous coaching response here; only the
/// transcript and scores are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorAttempt {
    pub transcript: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreCard>,
}

/// POST /api/analyze request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRequest {
    /// Base64-encoded WEBM/Opus recording
    #[serde(default)]
    pub audio_data: Option<String>,
    pub duration: DurationCategory,
    pub attempt_number: AttemptNumber,
    #[serde(default)]
    pub previous_attempts: Vec<PriorAttempt>,
    #[serde(default)]
    pub user_data: UserIdentity,
}

impl AttemptRequest {
    /// Scores of the most recent prior attempt, if that attempt was scored
    pub fn previous_scores(&self) -> Option<&ScoreCard> {
        self.previous_attempts.last()?.scores.as_ref()
    }
}

// ========================================
// Registration
// ========================================

/// Registration profile captured by the wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub native_language: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a profile with a freshly generated user id
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: Self::generate_user_id(),
            name: name.into(),
            email: email.into(),
            native_language: None,
            role: role.into(),
            created_at: Utc::now(),
        }
    }

    /// `user_<unix millis>_<9 lowercase alphanumerics>`
    pub fn generate_user_id() -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(|c| (c as char).to_ascii_lowercase())
            .collect();
        format!("user_{}_{}", Utc::now().timestamp_millis(), suffix)
    }

    /// Identity block sent along with each attempt
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            user_id: Some(self.user_id.clone()),
            email: Some(self.email.clone()),
            name: Some(self.name.clone()),
        }
    }
}
