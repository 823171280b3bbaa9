//! Client-side coaching session
//!
//! Models the wizard the browser walks through:
//!
//! LANDING → REGISTRATION → WARMUP → SCENARIO → RECORDING ⇄ COACHING → COMPLETE
//!
//! A session owns the current duration, round and recorded attempts, and
//! builds each [`AttemptRequest`] from them, so the coaching service never
//! keeps per-user state. Long-lived progress (profile and completed
//! durations) is written through an injected [`ProgressStore`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::api::{AttemptNumber, AttemptRequest, DurationCategory, PriorAttempt, UserProfile};
use crate::scores::ScoreCard;
use crate::warmup::CommunicationStyle;
use crate::{Error, Result};

/// Wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    Landing,
    Registration,
    Warmup,
    Scenario,
    Recording,
    Coaching,
    Complete,
}

/// Progress that survives between visits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedProgress {
    #[serde(default)]
    pub user: Option<UserProfile>,
    #[serde(default)]
    pub completed_durations: Vec<DurationCategory>,
    pub timestamp: DateTime<Utc>,
}

/// Persistence for [`SavedProgress`]
pub trait ProgressStore: Send + Sync {
    /// Previously saved progress, `None` on first visit
    fn load(&self) -> Result<Option<SavedProgress>>;

    fn save(&self, progress: &SavedProgress) -> Result<()>;
}

/// Progress stored as a JSON document on disk
pub struct JsonFileProgressStore {
    path: PathBuf,
}

impl JsonFileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonFileProgressStore {
    fn load(&self) -> Result<Option<SavedProgress>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, progress: &SavedProgress) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic replace via sibling temp file
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, serde_json::to_vec_pretty(progress)?)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// In-memory progress store
#[derive(Default)]
pub struct MemoryProgressStore {
    saved: Mutex<Option<SavedProgress>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self) -> Result<Option<SavedProgress>> {
        let saved = self
            .saved
            .lock()
            .map_err(|_| Error::Internal("progress store lock poisoned".to_string()))?;
        Ok(saved.clone())
    }

    fn save(&self, progress: &SavedProgress) -> Result<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| Error::Internal("progress store lock poisoned".to_string()))?;
        *saved = Some(progress.clone());
        Ok(())
    }
}

/// Attempt recorded during the current scenario
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAttempt {
    pub round: AttemptNumber,
    pub transcript: String,
    pub scores: ScoreCard,
    pub recorded_at: DateTime<Utc>,
}

/// Wizard session for one browser visit
pub struct CoachingSession {
    store: Arc<dyn ProgressStore>,
    step: WizardStep,
    user: Option<UserProfile>,
    style: Option<CommunicationStyle>,
    duration: Option<DurationCategory>,
    round: AttemptNumber,
    attempts: Vec<RecordedAttempt>,
    completed: BTreeSet<DurationCategory>,
}

impl CoachingSession {
    /// Start a session, restoring any saved profile and completed durations
    pub fn resume(store: Arc<dyn ProgressStore>) -> Result<Self> {
        let saved = store.load()?;
        let (user, completed) = match saved {
            Some(progress) => (
                progress.user,
                progress.completed_durations.into_iter().collect(),
            ),
            None => (None, BTreeSet::new()),
        };

        Ok(Self {
            store,
            step: WizardStep::Landing,
            user,
            style: None,
            duration: None,
            round: AttemptNumber::FIRST,
            attempts: Vec::new(),
            completed,
        })
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn style(&self) -> Option<&CommunicationStyle> {
        self.style.as_ref()
    }

    pub fn duration(&self) -> Option<DurationCategory> {
        self.duration
    }

    pub fn round(&self) -> AttemptNumber {
        self.round
    }

    pub fn attempts(&self) -> &[RecordedAttempt] {
        &self.attempts
    }

    pub fn completed_durations(&self) -> Vec<DurationCategory> {
        self.completed.iter().copied().collect()
    }

    /// Whether `duration` can be selected given the completed durations
    pub fn is_unlocked(&self, duration: DurationCategory) -> bool {
        duration
            .prerequisite()
            .map_or(true, |required| self.completed.contains(&required))
    }

    fn expect_step(&self, expected: WizardStep, action: &str) -> Result<()> {
        if self.step != expected {
            return Err(Error::InvalidInput(format!(
                "cannot {} during step {:?}",
                action, self.step
            )));
        }
        Ok(())
    }

    /// Write the profile together with `completed`
    fn persist(&self, completed: &BTreeSet<DurationCategory>) -> Result<()> {
        self.store.save(&SavedProgress {
            user: self.user.clone(),
            completed_durations: completed.iter().copied().collect(),
            timestamp: Utc::now(),
        })
    }

    pub fn start_challenge(&mut self) -> Result<()> {
        self.expect_step(WizardStep::Landing, "start the challenge")?;
        self.step = WizardStep::Registration;
        Ok(())
    }

    /// Store the registration profile and move on to the warm-up quiz
    pub fn complete_registration(&mut self, profile: UserProfile) -> Result<()> {
        self.expect_step(WizardStep::Registration, "register")?;
        self.user = Some(profile);
        self.persist(&self.completed)?;
        self.step = WizardStep::Warmup;
        Ok(())
    }

    pub fn complete_warmup(&mut self, style: CommunicationStyle) -> Result<()> {
        self.expect_step(WizardStep::Warmup, "finish the warm-up")?;
        self.style = Some(style);
        self.step = WizardStep::Scenario;
        Ok(())
    }

    /// Pick a duration and reset the round counter
    pub fn select_scenario(&mut self, duration: DurationCategory) -> Result<()> {
        self.expect_step(WizardStep::Scenario, "select a scenario")?;
        if !self.is_unlocked(duration) {
            return Err(Error::InvalidInput(format!(
                "the {} challenge is locked",
                duration
            )));
        }

        self.duration = Some(duration);
        self.round = AttemptNumber::FIRST;
        self.attempts.clear();
        self.step = WizardStep::Recording;
        Ok(())
    }

    /// Request for the round currently being recorded
    pub fn next_request(&self, audio_base64: String) -> Result<AttemptRequest> {
        self.expect_step(WizardStep::Recording, "submit a recording")?;
        let duration = self
            .duration
            .ok_or_else(|| Error::Internal("recording without a duration".to_string()))?;

        Ok(AttemptRequest {
            audio_data: Some(audio_base64),
            duration,
            attempt_number: self.round,
            previous_attempts: self
                .attempts
                .iter()
                .map(|a| PriorAttempt {
                    transcript: a.transcript.clone(),
                    scores: Some(a.scores),
                })
                .collect(),
            user_data: self.user.as_ref().map(UserProfile::identity).unwrap_or_default(),
        })
    }

    /// Record the coaching result of the current round
    pub fn record_attempt(&mut self, transcript: String, scores: ScoreCard) -> Result<()> {
        self.expect_step(WizardStep::Recording, "record an attempt")?;
        self.attempts.push(RecordedAttempt {
            round: self.round,
            transcript,
            scores,
            recorded_at: Utc::now(),
        });
        self.step = WizardStep::Coaching;
        Ok(())
    }

    /// Advance past the feedback screen
    ///
    /// Moves to the next round, or after the final round marks the duration
    /// completed, persists progress and finishes the challenge.
    pub fn continue_after_coaching(&mut self) -> Result<WizardStep> {
        self.expect_step(WizardStep::Coaching, "continue")?;

        match self.round.next() {
            Some(next_round) => {
                self.round = next_round;
                self.step = WizardStep::Recording;
            }
            None => {
                if let Some(duration) = self.duration {
                    if !self.completed.contains(&duration) {
                        // Memory only changes once the store has the new set
                        let mut completed = self.completed.clone();
                        completed.insert(duration);
                        self.persist(&completed)?;
                        self.completed = completed;
                    }
                }
                self.step = WizardStep::Complete;
            }
        }
        Ok(self.step)
    }

    /// Leave the completion screen to pick another duration
    pub fn try_another(&mut self) -> Result<()> {
        self.expect_step(WizardStep::Complete, "try another duration")?;
        self.round = AttemptNumber::FIRST;
        self.attempts.clear();
        self.duration = None;
        self.step = WizardStep::Scenario;
        Ok(())
    }
}
