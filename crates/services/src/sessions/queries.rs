use chrono::{DateTime, Utc};
use rand::Rng;

use exam_core::model::{QuizSetConfig, QuizSetId};
use storage::repository::{QuestionRepository, QuizSetRepository};

use super::plan::SessionPlan;
use super::service::ExamSession;
use crate::error::SessionError;

/// Storage-backed session construction.
pub struct SessionQueries;

impl SessionQueries {
    /// Load a quiz set and its question bank, randomize, and return a session
    /// already transitioned to `Active`.
    ///
    /// Load failures are fatal to session start: no `Active` session exists
    /// if either collaborator call fails.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the quiz set or questions cannot
    /// be loaded and `SessionError::Empty` when the set has no questions.
    pub async fn start_from_storage<R: Rng + ?Sized>(
        quiz_set_id: QuizSetId,
        quiz_sets: &dyn QuizSetRepository,
        questions: &dyn QuestionRepository,
        rng: &mut R,
        started_at: DateTime<Utc>,
    ) -> Result<(QuizSetConfig, ExamSession), SessionError> {
        let config = quiz_sets.get_quiz_set(quiz_set_id).await?;
        let bank = questions.questions_for_set(quiz_set_id).await?;

        let plan = SessionPlan::build(&bank, rng);
        let mut session = ExamSession::new(config.clone(), plan, started_at)?;
        session.start()?;
        Ok((config, session))
    }
}
