use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use exam_core::Clock;
use exam_core::model::{AnswerValue, QuestionId, QuizSetId, ScoreRecord, UserIdentity};
use storage::repository::{QuestionRepository, QuizSetRepository, ScoreRecordRepository};

use super::clock::ClockEvent;
use super::integrity::IntegrityAction;
use super::queries::SessionQueries;
use super::service::{AnswerOutcome, ExamSession, SubmitTrigger};
use crate::error::SessionError;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Proof that a score record was emitted and persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReceipt {
    pub record_id: i64,
    pub record: ScoreRecord,
}

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// This trigger won the race; exactly one record was persisted.
    Submitted(SubmitReceipt),
    /// Unanswered questions remain and the caller has not confirmed partial
    /// submission. Nothing was changed.
    ConfirmationRequired { unanswered: usize },
    /// Another trigger already engaged the guard (or the session is not
    /// active); this call was a silent no-op.
    Suppressed,
}

/// Result of delivering one clock tick through the workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub event: ClockEvent,
    /// Set when this tick expired the clock and won the submission race.
    pub submitted: Option<SubmitReceipt>,
}

/// Result of reporting one focus-loss edge through the workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusLossOutcome {
    pub action: IntegrityAction,
    /// Set when this signal forced submission and won the race.
    pub submitted: Option<SubmitReceipt>,
}

//
// ─── WORKFLOW ──────────────────────────────────────────────────────────────────
//

/// Orchestrates session start, event delivery and guarded submission.
///
/// All three submission triggers — manual, clock expiry, integrity — funnel
/// through one guarded routine, so exactly one `ScoreRecord` is persisted per
/// session no matter how the triggers race.
#[derive(Clone)]
pub struct ExamLoopService {
    clock: Clock,
    user: UserIdentity,
    quiz_sets: Arc<dyn QuizSetRepository>,
    questions: Arc<dyn QuestionRepository>,
    records: Arc<dyn ScoreRecordRepository>,
}

impl ExamLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        user: UserIdentity,
        quiz_sets: Arc<dyn QuizSetRepository>,
        questions: Arc<dyn QuestionRepository>,
        records: Arc<dyn ScoreRecordRepository>,
    ) -> Self {
        Self {
            clock,
            user,
            quiz_sets,
            questions,
            records,
        }
    }

    /// Start a new session for the given quiz set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for storage or session start failures.
    pub async fn start_session(&self, quiz_set_id: QuizSetId) -> Result<ExamSession, SessionError> {
        let mut rng = StdRng::from_os_rng();
        let started_at = self.clock.now();
        let (_config, session) = SessionQueries::start_from_storage(
            quiz_set_id,
            self.quiz_sets.as_ref(),
            self.questions.as_ref(),
            &mut rng,
            started_at,
        )
        .await?;
        Ok(session)
    }

    /// Record the user's answer to a question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when the session is not active or the question
    /// id is unknown.
    pub fn record_answer(
        &self,
        session: &mut ExamSession,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<AnswerOutcome, SessionError> {
        session.set_answer(question_id, value)
    }

    /// User-requested submission.
    ///
    /// With `confirmed` false, unanswered questions produce
    /// `SubmitOutcome::ConfirmationRequired` so the UI can ask the user to
    /// confirm an intentional partial submission; pass `confirmed = true`
    /// after they do. The confirmation is a UX nicety only — it never affects
    /// scoring.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the persist fails; the session
    /// rolls back to `Active` so submission can be retried.
    pub async fn submit(
        &self,
        session: &mut ExamSession,
        confirmed: bool,
    ) -> Result<SubmitOutcome, SessionError> {
        if !confirmed {
            let unanswered = session.unanswered_count();
            if unanswered > 0 {
                return Ok(SubmitOutcome::ConfirmationRequired { unanswered });
            }
        }
        self.finish(session, SubmitTrigger::Manual).await
    }

    /// Deliver one clock tick; on expiry, drive automatic submission with
    /// whatever answers exist at that moment.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when an expiry-triggered persist
    /// fails; the session rolls back to `Active`.
    pub async fn handle_tick(&self, session: &mut ExamSession) -> Result<TickOutcome, SessionError> {
        let event = session.tick();
        let submitted = if event == ClockEvent::Expired {
            self.finish(session, SubmitTrigger::TimeExpired)
                .await?
                .into_receipt()
        } else {
            None
        };
        Ok(TickOutcome { event, submitted })
    }

    /// Report one focus-loss edge; on the fourth violation submission is
    /// forced immediately, bypassing the unanswered-questions confirmation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when a forced persist fails; the
    /// session rolls back to `Active`.
    pub async fn report_focus_loss(
        &self,
        session: &mut ExamSession,
    ) -> Result<FocusLossOutcome, SessionError> {
        let action = session.report_focus_loss();
        let submitted = if action == IntegrityAction::ForceSubmit {
            self.finish(session, SubmitTrigger::Integrity)
                .await?
                .into_receipt()
        } else {
            None
        };
        Ok(FocusLossOutcome { action, submitted })
    }

    /// The single guarded submission pipeline shared by all triggers.
    async fn finish(
        &self,
        session: &mut ExamSession,
        trigger: SubmitTrigger,
    ) -> Result<SubmitOutcome, SessionError> {
        // The guard is taken synchronously, before any await, so a racing
        // trigger observes it immediately.
        if !session.begin_submission(trigger) {
            return Ok(SubmitOutcome::Suppressed);
        }

        let record = match session.build_score_record(&self.user, self.clock.now()) {
            Ok(record) => record,
            Err(e) => {
                session.abort_submission()?;
                return Err(e);
            }
        };

        match self.records.append_record(&record).await {
            Ok(record_id) => {
                session.complete_submission(record_id)?;
                Ok(SubmitOutcome::Submitted(SubmitReceipt { record_id, record }))
            }
            Err(e) => {
                session.abort_submission()?;
                Err(SessionError::Storage(e))
            }
        }
    }
}

impl SubmitOutcome {
    fn into_receipt(self) -> Option<SubmitReceipt> {
        match self {
            Self::Submitted(receipt) => Some(receipt),
            Self::ConfirmationRequired { .. } | Self::Suppressed => None,
        }
    }
}
