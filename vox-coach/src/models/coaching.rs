//! Coaching feedback produced by the generation stage
//!
//! The model reply is untrusted. It is parsed into [`ModelFeedback`]
//! (type mismatches are rejected), and [`finalize`] turns that into the
//! [`CoachingResult`] returned to the browser:
//!
//! - sub-scores must lie within 0–10
//! - `overall_score` is recomputed from this attempt's sub-scores
//! - `improvement` is computed here from the previous attempt's scores,
//!   never taken from the model
//! - `transformation_summary` only survives on the final round

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vox_common::api::AttemptNumber;
use vox_common::{Improvement, ScoreCard};

/// Why a model reply could not be turned into a coaching result
#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("Reply is not valid coaching JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scores in reply: {0}")]
    Scores(String),

    #[error("Reply field '{0}' is empty")]
    EmptyField(&'static str),
}

/// The model's reading of what the speaker is trying to say
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhatHearing {
    #[serde(default)]
    pub core_identity: String,
    #[serde(default)]
    pub what_they_do: String,
    #[serde(default)]
    pub whats_unclear: String,
}

/// Final-round synthesis of all three attempts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformationSummary {
    #[serde(default)]
    pub round_1: String,
    #[serde(default)]
    pub round_2: String,
    #[serde(default)]
    pub round_3: String,
    #[serde(default)]
    pub breakthrough_moment: String,
    /// Communication archetype name
    #[serde(default)]
    pub archetype: String,
    #[serde(default)]
    pub what_you_learned: Vec<String>,
    /// 80–100 word summary meant for voice playback
    #[serde(default)]
    pub spoken_transformation: String,
}

/// Reply schema requested from the generation service
///
/// Any `improvement` block the model volunteers is ignored; unknown keys
/// are dropped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelFeedback {
    pub scores: ScoreCard,
    pub spoken_summary: String,
    #[serde(default)]
    pub spoken_intro: String,
    #[serde(default)]
    pub what_hearing: Option<WhatHearing>,
    #[serde(default)]
    pub what_needs_sharpening: Vec<String>,
    pub rewritten_version: String,
    #[serde(default)]
    pub why_this_works: String,
    #[serde(default)]
    pub what_changed: String,
    #[serde(default)]
    pub rephrase_options: Vec<String>,
    #[serde(default)]
    pub transformation_summary: Option<TransformationSummary>,
    #[serde(default)]
    pub next_instruction: String,
}

/// Validated coaching feedback for one attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingResult {
    pub scores: ScoreCard,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement: Option<Improvement>,
    /// 120–160 word mentor summary rendered to audio
    pub spoken_summary: String,
    #[serde(default)]
    pub spoken_intro: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what_hearing: Option<WhatHearing>,
    #[serde(default)]
    pub what_needs_sharpening: Vec<String>,
    pub rewritten_version: String,
    #[serde(default)]
    pub why_this_works: String,
    #[serde(default)]
    pub what_changed: String,
    #[serde(default)]
    pub rephrase_options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation_summary: Option<TransformationSummary>,
    #[serde(default)]
    pub next_instruction: String,
}

/// Remove a surrounding Markdown code fence, if any
///
/// Handles both the multi-line form and the single-line
/// `` ```json{...}``` `` form. Text without a leading fence is returned
/// trimmed but otherwise unchanged.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Language tag, e.g. "json"
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse raw model text into typed feedback
pub fn parse_coaching_reply(raw: &str) -> Result<ModelFeedback, ReplyError> {
    Ok(serde_json::from_str(strip_code_fences(raw))?)
}

/// Validate model feedback and derive the server-computed fields
pub fn finalize(
    feedback: ModelFeedback,
    attempt: AttemptNumber,
    previous_scores: Option<&ScoreCard>,
) -> Result<CoachingResult, ReplyError> {
    feedback.scores.validate().map_err(ReplyError::Scores)?;

    if feedback.spoken_summary.trim().is_empty() {
        return Err(ReplyError::EmptyField("spoken_summary"));
    }
    if feedback.rewritten_version.trim().is_empty() {
        return Err(ReplyError::EmptyField("rewritten_version"));
    }

    let scores = feedback.scores.with_recomputed_overall();
    if (scores.overall_score - feedback.scores.overall_score).abs() > f64::EPSILON {
        tracing::debug!(
            reported = feedback.scores.overall_score,
            computed = scores.overall_score,
            "Replacing model overall score"
        );
    }

    let improvement = if attempt.is_first() {
        None
    } else {
        previous_scores.map(|previous| scores.improvement_over(previous))
    };

    let transformation_summary = if attempt.is_final() {
        if feedback.transformation_summary.is_none() {
            tracing::warn!("Final-round reply has no transformation_summary");
        }
        feedback.transformation_summary
    } else {
        if feedback.transformation_summary.is_some() {
            tracing::debug!(attempt = attempt.get(), "Dropping transformation_summary before final round");
        }
        None
    };

    Ok(CoachingResult {
        scores,
        improvement,
        spoken_summary: feedback.spoken_summary,
        spoken_intro: feedback.spoken_intro,
        what_hearing: feedback.what_hearing,
        what_needs_sharpening: feedback.what_needs_sharpening,
        rewritten_version: feedback.rewritten_version,
        why_this_works: feedback.why_this_works,
        what_changed: feedback.what_changed,
        rephrase_options: feedback.rephrase_options,
        transformation_summary,
        next_instruction: feedback.next_instruction,
    })
}
