use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuizSetId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSetError {
    #[error("quiz set name cannot be empty")]
    EmptyName,
}

//
// ─── QUIZ SET CONFIG ───────────────────────────────────────────────────────────
//

/// Configuration of one quiz set.
///
/// A survey set disables scoring, the countdown clock and integrity
/// monitoring. Instant feedback reveals per-question correctness as soon as a
/// question is answered and locks it against edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSetConfig {
    id: QuizSetId,
    name: String,
    time_limit_minutes: u32,
    is_survey: bool,
    instant_feedback: bool,
}

impl QuizSetConfig {
    /// Create a quiz-set configuration.
    ///
    /// A `time_limit_minutes` of 0 means "no configured limit"; the session
    /// clock falls back to one second per question in that case. The limit is
    /// ignored entirely for surveys.
    ///
    /// # Errors
    ///
    /// Returns `QuizSetError::EmptyName` if the name is blank.
    pub fn new(
        id: QuizSetId,
        name: impl Into<String>,
        time_limit_minutes: u32,
    ) -> Result<Self, QuizSetError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(QuizSetError::EmptyName);
        }

        Ok(Self {
            id,
            name,
            time_limit_minutes,
            is_survey: false,
            instant_feedback: false,
        })
    }

    /// Mark this set as a survey (no scoring, no clock, no integrity monitor).
    #[must_use]
    pub fn as_survey(mut self) -> Self {
        self.is_survey = true;
        self
    }

    /// Enable or disable instant per-question feedback.
    #[must_use]
    pub fn with_instant_feedback(mut self, enabled: bool) -> Self {
        self.instant_feedback = enabled;
        self
    }

    #[must_use]
    pub fn id(&self) -> QuizSetId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
    }

    #[must_use]
    pub fn is_survey(&self) -> bool {
        self.is_survey
    }

    #[must_use]
    pub fn instant_feedback(&self) -> bool {
        self.instant_feedback
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
