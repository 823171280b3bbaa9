//! Analysis pipeline state machine
//!
//! One run per analyzed attempt:
//! RECEIVED → TRANSCRIBING → TRANSCRIBED → GENERATING → GENERATED →
//! (PERSISTING) → RESPONDING → DONE
//!
//! `ERROR` is reached from TRANSCRIBING or GENERATING when a downstream call
//! fails. `REJECTED` is reached from RECEIVED (missing audio or credentials)
//! and from TRANSCRIBED (empty transcript).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Analysis pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalysisState {
    /// Request accepted, not yet validated
    Received,
    /// Waiting on the speech service
    Transcribing,
    /// Transcript available
    Transcribed,
    /// Waiting on the generation service
    Generating,
    /// Coaching result parsed and validated
    Generated,
    /// Writing the attempt record (only when a datastore is configured)
    Persisting,
    /// Assembling the response payload
    Responding,
    Done,
    Error,
    Rejected,
}

impl AnalysisState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Rejected)
    }

    /// Whether the pipeline may move from `self` to `next`
    pub fn can_transition_to(self, next: AnalysisState) -> bool {
        use AnalysisState::*;
        matches!(
            (self, next),
            (Received, Transcribing)
                | (Received, Rejected)
                | (Transcribing, Transcribed)
                | (Transcribing, Error)
                | (Transcribed, Generating)
                | (Transcribed, Rejected)
                | (Generating, Generated)
                | (Generating, Error)
                | (Generated, Persisting)
                | (Generated, Responding)
                | (Persisting, Responding)
                | (Responding, Done)
        )
    }
}

/// State transition event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub run_id: Uuid,
    pub old_state: AnalysisState,
    pub new_state: AnalysisState,
    pub transitioned_at: DateTime<Utc>,
}

/// In-memory record of a single analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub run_id: Uuid,
    pub state: AnalysisState,
    pub transitions: Vec<StateTransition>,
    pub started_at: DateTime<Utc>,
    /// Set once a terminal state is reached
    pub ended_at: Option<DateTime<Utc>>,
}

impl AnalysisRun {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: AnalysisState::Received,
            transitions: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Move to `new_state`
    ///
    /// Transitions not allowed by [`AnalysisState::can_transition_to`] are
    /// logged and ignored, leaving the run in its current state.
    pub fn transition_to(&mut self, new_state: AnalysisState) -> Option<&StateTransition> {
        if !self.state.can_transition_to(new_state) {
            tracing::warn!(
                run_id = %self.run_id,
                from = ?self.state,
                to = ?new_state,
                "Ignoring invalid analysis state transition"
            );
            return None;
        }

        tracing::debug!(run_id = %self.run_id, from = ?self.state, to = ?new_state, "Analysis state transition");

        self.transitions.push(StateTransition {
            run_id: self.run_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        });
        self.state = new_state;

        if new_state.is_terminal() {
            self.ended_at = Some(Utc::now());
        }

        self.transitions.last()
    }

    /// States visited so far, starting with RECEIVED
    pub fn path(&self) -> Vec<AnalysisState> {
        std::iter::once(AnalysisState::Received)
            .chain(self.transitions.iter().map(|t| t.new_state))
            .collect()
    }

    pub fn elapsed_ms(&self) -> i64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds()
    }
}

impl Default for AnalysisRun {
    fn default() -> Self {
        Self::new()
    }
}
