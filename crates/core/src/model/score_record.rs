use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::answer::AnswerValue;
use crate::model::ids::{QuestionId, QuizSetId};
use crate::model::user::UserIdentity;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ScoreRecordError {
    #[error("raw score ({raw}) exceeds total possible points ({total})")]
    ScoreExceedsTotal { raw: u32, total: u32 },

    #[error("final score ({got}) does not equal max(0, raw - penalty) ({expected})")]
    FinalScoreMismatch { expected: u32, got: u32 },

    #[error("percentage ({got}) does not match recomputed value ({expected})")]
    PercentageMismatch { expected: f64, got: f64 },

    #[error("answer recorded for question {0} missing from the question order")]
    AnswerOutsideOrder(QuestionId),
}

/// Immutable result artifact of a completed session.
///
/// Produced exactly once per session and handed to the persistence
/// collaborator; the engine never mutates it afterwards. `question_order`
/// preserves the randomized sequence the user actually saw so a later review
/// can replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    user: UserIdentity,
    quiz_set_id: QuizSetId,
    quiz_set_name: String,
    raw_score: u32,
    penalty_points: u32,
    final_score: u32,
    total_points: u32,
    percentage: f64,
    answers: BTreeMap<QuestionId, AnswerValue>,
    question_order: Vec<QuestionId>,
    tamper_count: u32,
    created_at: DateTime<Utc>,
}

impl ScoreRecord {
    /// Build a record from raw scoring inputs, deriving the dependent fields.
    ///
    /// `final_score = max(0, raw_score - penalty_points)`;
    /// `percentage = final / total * 100` when `total > 0`, else 0.
    ///
    /// # Errors
    ///
    /// Returns `ScoreRecordError::ScoreExceedsTotal` if `raw_score` is larger
    /// than `total_points`, or `AnswerOutsideOrder` if an answer references a
    /// question id not present in `question_order`.
    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        user: UserIdentity,
        quiz_set_id: QuizSetId,
        quiz_set_name: impl Into<String>,
        raw_score: u32,
        penalty_points: u32,
        total_points: u32,
        answers: BTreeMap<QuestionId, AnswerValue>,
        question_order: Vec<QuestionId>,
        tamper_count: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ScoreRecordError> {
        if raw_score > total_points {
            return Err(ScoreRecordError::ScoreExceedsTotal {
                raw: raw_score,
                total: total_points,
            });
        }
        if let Some(id) = answers.keys().find(|id| !question_order.contains(*id)) {
            return Err(ScoreRecordError::AnswerOutsideOrder(*id));
        }

        let final_score = raw_score.saturating_sub(penalty_points);
        let percentage = percentage_of(final_score, total_points);

        Ok(Self {
            user,
            quiz_set_id,
            quiz_set_name: quiz_set_name.into(),
            raw_score,
            penalty_points,
            final_score,
            total_points,
            percentage,
            answers,
            question_order,
            tamper_count,
            created_at,
        })
    }

    /// Rehydrate a record from persisted storage, checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns `ScoreRecordError::FinalScoreMismatch` or
    /// `ScoreRecordError::PercentageMismatch` when the stored derived fields
    /// disagree with recomputation, plus the `compute` errors.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        user: UserIdentity,
        quiz_set_id: QuizSetId,
        quiz_set_name: impl Into<String>,
        raw_score: u32,
        penalty_points: u32,
        final_score: u32,
        total_points: u32,
        percentage: f64,
        answers: BTreeMap<QuestionId, AnswerValue>,
        question_order: Vec<QuestionId>,
        tamper_count: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ScoreRecordError> {
        let expected_final = raw_score.saturating_sub(penalty_points);
        if final_score != expected_final {
            return Err(ScoreRecordError::FinalScoreMismatch {
                expected: expected_final,
                got: final_score,
            });
        }
        let expected_pct = percentage_of(final_score, total_points);
        if (percentage - expected_pct).abs() > 1e-6 {
            return Err(ScoreRecordError::PercentageMismatch {
                expected: expected_pct,
                got: percentage,
            });
        }

        Self::compute(
            user,
            quiz_set_id,
            quiz_set_name,
            raw_score,
            penalty_points,
            total_points,
            answers,
            question_order,
            tamper_count,
            created_at,
        )
    }

    #[must_use]
    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    #[must_use]
    pub fn quiz_set_id(&self) -> QuizSetId {
        self.quiz_set_id
    }

    #[must_use]
    pub fn quiz_set_name(&self) -> &str {
        &self.quiz_set_name
    }

    #[must_use]
    pub fn raw_score(&self) -> u32 {
        self.raw_score
    }

    #[must_use]
    pub fn penalty_points(&self) -> u32 {
        self.penalty_points
    }

    #[must_use]
    pub fn final_score(&self) -> u32 {
        self.final_score
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    #[must_use]
    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, AnswerValue> {
        &self.answers
    }

    #[must_use]
    pub fn question_order(&self) -> &[QuestionId] {
        &self.question_order
    }

    #[must_use]
    pub fn tamper_count(&self) -> u32 {
        self.tamper_count
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn percentage_of(final_score: u32, total_points: u32) -> f64 {
    if total_points > 0 {
        f64::from(final_score) / f64::from(total_points) * 100.0
    } else {
        0.0
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn user() -> UserIdentity {
        UserIdentity::new("u1", "Test Taker", "QA")
    }

    fn record(raw: u32, penalty: u32, total: u32) -> ScoreRecord {
        ScoreRecord::compute(
            user(),
            QuizSetId::new(1),
            "Midterm",
            raw,
            penalty,
            total,
            BTreeMap::new(),
            Vec::new(),
            0,
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn final_score_never_negative() {
        let r = record(2, 5, 10);
        assert_eq!(r.final_score(), 0);
        assert_eq!(r.percentage(), 0.0);
    }

    #[test]
    fn percentage_from_final_score() {
        let r = record(8, 3, 10);
        assert_eq!(r.final_score(), 5);
        assert!((r.percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_total_yields_zero_percentage() {
        let r = record(0, 0, 0);
        assert_eq!(r.percentage(), 0.0);
    }

    #[test]
    fn raw_above_total_rejected() {
        let err = ScoreRecord::compute(
            user(),
            QuizSetId::new(1),
            "Midterm",
            11,
            0,
            10,
            BTreeMap::new(),
            Vec::new(),
            0,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, ScoreRecordError::ScoreExceedsTotal { .. }));
    }

    #[test]
    fn answers_must_reference_question_order() {
        let mut answers = BTreeMap::new();
        answers.insert(QuestionId::new(9), AnswerValue::value("a"));
        let err = ScoreRecord::compute(
            user(),
            QuizSetId::new(1),
            "Midterm",
            0,
            0,
            1,
            answers,
            vec![QuestionId::new(1)],
            0,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, ScoreRecordError::AnswerOutsideOrder(_)));
    }

    #[test]
    fn from_persisted_rejects_tampered_final_score() {
        let err = ScoreRecord::from_persisted(
            user(),
            QuizSetId::new(1),
            "Midterm",
            5,
            2,
            5, // should be 3
            10,
            30.0,
            BTreeMap::new(),
            Vec::new(),
            2,
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, ScoreRecordError::FinalScoreMismatch { .. }));
    }

    #[test]
    fn from_persisted_round_trip() {
        let original = record(8, 3, 10);
        let restored = ScoreRecord::from_persisted(
            original.user().clone(),
            original.quiz_set_id(),
            original.quiz_set_name(),
            original.raw_score(),
            original.penalty_points(),
            original.final_score(),
            original.total_points(),
            original.percentage(),
            original.answers().clone(),
            original.question_order().to_vec(),
            original.tamper_count(),
            original.created_at(),
        )
        .unwrap();
        assert_eq!(original, restored);
    }
}
