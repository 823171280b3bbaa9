//! Data models for vox-coach
//!
//! - Analysis pipeline state machine
//! - Coaching feedback schema and validation
//! - Persisted attempt record

pub mod analysis_state;
pub mod attempt_record;
pub mod coaching;

pub use analysis_state::{AnalysisRun, AnalysisState, StateTransition};
pub use attempt_record::AttemptRecord;
pub use coaching::{
    finalize, parse_coaching_reply, strip_code_fences, CoachingResult, ModelFeedback, ReplyError,
    TransformationSummary, WhatHearing,
};
