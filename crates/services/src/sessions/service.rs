use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use exam_core::evaluator::is_correct;
use exam_core::model::{
    AnswerValue, Question, QuestionId, QuizSetConfig, ScoreRecord, UserIdentity,
};

use super::clock::{ClockEvent, CountdownClock};
use super::integrity::{IntegrityAction, IntegrityMonitor};
use super::plan::SessionPlan;
use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── PHASES AND OUTCOMES ───────────────────────────────────────────────────────
//

/// Lifecycle of one session. Transitions are one-directional; the only
/// backward edge is `Submitting → Active` on a recoverable persistence
/// failure, and no phase is otherwise re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Preparing,
    Active,
    Submitting,
    Terminal,
}

/// Which event won the race to finalize the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitTrigger {
    Manual,
    TimeExpired,
    Integrity,
}

/// Result of recording an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded,
    /// Instant-feedback sets lock a question once it has a non-blank answer;
    /// later writes are ignored.
    Locked,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed attempt at a quiz set, from preparation to terminal scoring.
///
/// `ExamSession` owns all mutable session state. The per-second tick, the
/// focus-loss signals and user answer/submit actions all funnel through
/// `&mut self` methods, so mutations are serialized by ownership — there is
/// no interior mutability and no ambient global state.
pub struct ExamSession {
    config: QuizSetConfig,
    questions: Vec<Question>,
    question_order: Vec<QuestionId>,
    answers: BTreeMap<QuestionId, AnswerValue>,
    clock: Option<CountdownClock>,
    monitor: IntegrityMonitor,
    phase: SessionPhase,
    submit_trigger: Option<SubmitTrigger>,
    started_at: DateTime<Utc>,
    record_id: Option<i64>,
}

impl ExamSession {
    /// Create a session from a prepared plan. The session starts in
    /// `Preparing`; call [`start`](Self::start) once the host is ready to
    /// show the first question.
    ///
    /// Surveys get no countdown clock; exams get `time_limit * 60` seconds
    /// or the one-second-per-question fallback.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the plan has no questions.
    pub fn new(
        config: QuizSetConfig,
        plan: SessionPlan,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if plan.is_empty() {
            return Err(SessionError::Empty);
        }

        let clock = (!config.is_survey())
            .then(|| CountdownClock::for_exam(config.time_limit_minutes(), plan.len()));
        let (questions, question_order) = plan.into_parts();

        Ok(Self {
            config,
            questions,
            question_order,
            answers: BTreeMap::new(),
            clock,
            monitor: IntegrityMonitor::new(),
            phase: SessionPhase::Preparing,
            submit_trigger: None,
            started_at,
            record_id: None,
        })
    }

    /// Transition `Preparing → Active`: answers become mutable, the clock
    /// starts consuming ticks and integrity signals take effect.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is `Preparing`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Preparing {
            return Err(SessionError::InvalidPhase(self.phase));
        }
        self.phase = SessionPhase::Active;
        Ok(())
    }

    // ─── Read access ────────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &QuizSetConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The randomized question sequence as shown to the user.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_order(&self) -> &[QuestionId] {
        &self.question_order
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, AnswerValue> {
        &self.answers
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Remaining seconds; `None` for surveys.
    #[must_use]
    pub fn remaining_seconds(&self) -> Option<u32> {
        self.clock.as_ref().map(CountdownClock::remaining)
    }

    #[must_use]
    pub fn tamper_count(&self) -> u32 {
        self.monitor.tamper_count()
    }

    #[must_use]
    pub fn penalty_points(&self) -> u32 {
        self.monitor.penalty_points()
    }

    /// Which trigger won the submission race, once one has.
    #[must_use]
    pub fn submit_trigger(&self) -> Option<SubmitTrigger> {
        self.submit_trigger
    }

    /// Storage id of the emitted score record, set on `Terminal`.
    #[must_use]
    pub fn record_id(&self) -> Option<i64> {
        self.record_id
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.phase == SessionPhase::Terminal
    }

    /// True when the question has a non-blank answer recorded.
    #[must_use]
    pub fn is_answered(&self, question_id: QuestionId) -> bool {
        self.answers
            .get(&question_id)
            .is_some_and(|a| !a.is_blank())
    }

    /// Number of questions still missing a usable answer.
    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| !self.is_answered(q.id()))
            .count()
    }

    /// Per-question correctness for instant-feedback sets.
    ///
    /// `None` unless the set is in instant-feedback mode and the question has
    /// a non-blank answer. Display-only: scoring happens once, at submission.
    #[must_use]
    pub fn answer_feedback(&self, question_id: QuestionId) -> Option<bool> {
        if !self.config.instant_feedback() || !self.is_answered(question_id) {
            return None;
        }
        let question = self.questions.iter().find(|q| q.id() == question_id)?;
        Some(is_correct(question, self.answers.get(&question_id)))
    }

    /// Returns a summary of the current session state.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let unanswered = self.unanswered_count();
        SessionProgress {
            total: self.questions.len(),
            answered: self.questions.len() - unanswered,
            unanswered,
            remaining_seconds: self.remaining_seconds(),
            tamper_count: self.tamper_count(),
            penalty_points: self.penalty_points(),
            phase: self.phase,
        }
    }

    // ─── Event handling ─────────────────────────────────────────────────────

    /// Record or replace the user's answer to a question.
    ///
    /// Only valid while `Active`. On instant-feedback sets a question with a
    /// non-blank answer is read-only; the call is ignored and reports
    /// [`AnswerOutcome::Locked`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` outside `Active` and
    /// `SessionError::UnknownQuestion` for ids not in this session.
    pub fn set_answer(
        &mut self,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<AnswerOutcome, SessionError> {
        if self.phase != SessionPhase::Active {
            return Err(SessionError::InvalidPhase(self.phase));
        }
        if !self.questions.iter().any(|q| q.id() == question_id) {
            return Err(SessionError::UnknownQuestion(question_id));
        }
        if self.config.instant_feedback() && self.is_answered(question_id) {
            return Ok(AnswerOutcome::Locked);
        }

        self.answers.insert(question_id, value);
        Ok(AnswerOutcome::Recorded)
    }

    /// Deliver one clock tick.
    ///
    /// Ticks outside `Active`, or on surveys, are `Idle` — the clock keeps
    /// receiving ticks while submission is in flight but they have no effect.
    /// At most one `Expired` is ever returned; the caller drives automatic
    /// submission from it.
    pub fn tick(&mut self) -> ClockEvent {
        if self.phase != SessionPhase::Active {
            return ClockEvent::Idle;
        }
        match self.clock.as_mut() {
            Some(clock) => clock.tick(),
            None => ClockEvent::Idle,
        }
    }

    /// Report one focus-loss edge.
    ///
    /// Ignored for surveys and outside `Active`. The caller forces submission
    /// when the returned action is [`IntegrityAction::ForceSubmit`].
    pub fn report_focus_loss(&mut self) -> IntegrityAction {
        if self.config.is_survey() || self.phase != SessionPhase::Active {
            return IntegrityAction::Ignored;
        }
        self.monitor.record_signal()
    }

    // ─── Submission ─────────────────────────────────────────────────────────

    /// Try to engage the re-entrancy guard: `Active → Submitting`.
    ///
    /// Exactly one caller per session gets `true`; every later trigger —
    /// a racing tick, a duplicate focus-loss, a second click — gets `false`
    /// and must treat the submission as someone else's.
    pub fn begin_submission(&mut self, trigger: SubmitTrigger) -> bool {
        if self.phase != SessionPhase::Active {
            return false;
        }
        self.phase = SessionPhase::Submitting;
        self.submit_trigger = Some(trigger);
        true
    }

    /// Compute the score record for the persistence collaborator.
    ///
    /// Surveys score 0 out of 0; exams sum points over questions whose
    /// recorded answer the evaluator accepts, then subtract the tamper
    /// penalty, clamped at zero.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is
    /// `Submitting`, or a `ScoreRecordError` if the parts are inconsistent.
    pub fn build_score_record(
        &self,
        user: &UserIdentity,
        created_at: DateTime<Utc>,
    ) -> Result<ScoreRecord, SessionError> {
        if self.phase != SessionPhase::Submitting {
            return Err(SessionError::InvalidPhase(self.phase));
        }

        let (raw_score, total_points) = if self.config.is_survey() {
            (0, 0)
        } else {
            let raw = self
                .questions
                .iter()
                .filter(|q| is_correct(q, self.answers.get(&q.id())))
                .map(Question::points)
                .sum();
            let total = self.questions.iter().map(Question::points).sum();
            (raw, total)
        };

        Ok(ScoreRecord::compute(
            user.clone(),
            self.config.id(),
            self.config.name(),
            raw_score,
            self.monitor.penalty_points(),
            total_points,
            self.answers.clone(),
            self.question_order.clone(),
            self.monitor.tamper_count(),
            created_at,
        )?)
    }

    /// Finalize after a successful persist: `Submitting → Terminal`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is `Submitting`.
    pub fn complete_submission(&mut self, record_id: i64) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Submitting {
            return Err(SessionError::InvalidPhase(self.phase));
        }
        self.phase = SessionPhase::Terminal;
        self.record_id = Some(record_id);
        Ok(())
    }

    /// Roll the guard back after a failed persist: `Submitting → Active`.
    ///
    /// Answers, tamper count and penalties are untouched, so the user can
    /// retry submission without losing anything.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidPhase` unless the session is `Submitting`.
    pub fn abort_submission(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Submitting {
            return Err(SessionError::InvalidPhase(self.phase));
        }
        self.phase = SessionPhase::Active;
        self.submit_trigger = None;
        Ok(())
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("quiz_set_id", &self.config.id())
            .field("questions_len", &self.questions.len())
            .field("answers_len", &self.answers.len())
            .field("phase", &self.phase)
            .field("remaining_seconds", &self.remaining_seconds())
            .field("tamper_count", &self.tamper_count())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{CorrectAnswer, QuestionKind, QuizSetId};
    use exam_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build_question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            QuestionKind::SingleChoice,
            format!("Question {id}"),
            vec!["right".into(), "wrong".into()],
            CorrectAnswer::Value("right".into()),
        )
        .unwrap()
    }

    fn build_config() -> QuizSetConfig {
        QuizSetConfig::new(QuizSetId::new(1), "Midterm", 10).unwrap()
    }

    fn active_session(config: QuizSetConfig, count: u64) -> ExamSession {
        let questions: Vec<Question> = (1..=count).map(build_question).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let plan = SessionPlan::build(&questions, &mut rng);
        let mut session = ExamSession::new(config, plan, fixed_now()).unwrap();
        session.start().unwrap();
        session
    }

    fn user() -> UserIdentity {
        UserIdentity::new("u1", "Test Taker", "QA")
    }

    #[test]
    fn empty_plan_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let plan = SessionPlan::build(&[], &mut rng);
        let err = ExamSession::new(build_config(), plan, fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn phases_move_one_way() {
        let mut session = active_session(build_config(), 2);
        assert_eq!(session.phase(), SessionPhase::Active);
        // cannot start twice
        assert!(matches!(
            session.start(),
            Err(SessionError::InvalidPhase(SessionPhase::Active))
        ));

        assert!(session.begin_submission(SubmitTrigger::Manual));
        assert_eq!(session.phase(), SessionPhase::Submitting);
        session.complete_submission(7).unwrap();
        assert!(session.is_terminal());
        assert_eq!(session.record_id(), Some(7));
    }

    #[test]
    fn guard_admits_exactly_one_trigger() {
        let mut session = active_session(build_config(), 2);
        assert!(session.begin_submission(SubmitTrigger::TimeExpired));
        assert!(!session.begin_submission(SubmitTrigger::Manual));
        assert!(!session.begin_submission(SubmitTrigger::Integrity));
        assert_eq!(session.submit_trigger(), Some(SubmitTrigger::TimeExpired));

        session.complete_submission(1).unwrap();
        assert!(!session.begin_submission(SubmitTrigger::Manual));
    }

    #[test]
    fn abort_rolls_back_and_preserves_state() {
        let mut session = active_session(build_config(), 2);
        let qid = session.questions()[0].id();
        session.set_answer(qid, AnswerValue::value("right")).unwrap();
        session.report_focus_loss();
        session.report_focus_loss();
        assert_eq!(session.penalty_points(), 2);

        assert!(session.begin_submission(SubmitTrigger::Manual));
        session.abort_submission().unwrap();
        assert_eq!(session.phase(), SessionPhase::Active);
        assert_eq!(session.submit_trigger(), None);
        // answers and tamper state survived the failed attempt
        assert!(session.is_answered(qid));
        assert_eq!(session.tamper_count(), 2);
        assert_eq!(session.penalty_points(), 2);

        // retry succeeds
        assert!(session.begin_submission(SubmitTrigger::Manual));
        session.complete_submission(3).unwrap();
        assert!(session.is_terminal());
    }

    #[test]
    fn answers_only_mutable_while_active() {
        let mut session = active_session(build_config(), 2);
        let qid = session.questions()[0].id();
        session.begin_submission(SubmitTrigger::Manual);
        let err = session
            .set_answer(qid, AnswerValue::value("right"))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidPhase(_)));
    }

    #[test]
    fn unknown_question_is_an_error() {
        let mut session = active_session(build_config(), 2);
        let err = session
            .set_answer(QuestionId::new(99), AnswerValue::value("x"))
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownQuestion(_)));
    }

    #[test]
    fn instant_feedback_locks_answered_questions() {
        let config = build_config().with_instant_feedback(true);
        let mut session = active_session(config, 2);
        let qid = session.questions()[0].id();

        let first = session.set_answer(qid, AnswerValue::value("wrong")).unwrap();
        assert_eq!(first, AnswerOutcome::Recorded);
        assert_eq!(session.answer_feedback(qid), Some(false));

        // locked: the wrong answer stays
        let second = session.set_answer(qid, AnswerValue::value("right")).unwrap();
        assert_eq!(second, AnswerOutcome::Locked);
        assert_eq!(session.answers()[&qid], AnswerValue::value("wrong"));
    }

    #[test]
    fn feedback_hidden_without_instant_feedback_mode() {
        let mut session = active_session(build_config(), 2);
        let qid = session.questions()[0].id();
        session.set_answer(qid, AnswerValue::value("right")).unwrap();
        assert_eq!(session.answer_feedback(qid), None);
    }

    #[test]
    fn blank_answers_count_as_unanswered_and_stay_editable() {
        let config = build_config().with_instant_feedback(true);
        let mut session = active_session(config, 2);
        let qid = session.questions()[0].id();

        session.set_answer(qid, AnswerValue::value("   ")).unwrap();
        assert!(!session.is_answered(qid));
        assert_eq!(session.unanswered_count(), 2);

        // a blank answer does not lock the question
        let outcome = session.set_answer(qid, AnswerValue::value("right")).unwrap();
        assert_eq!(outcome, AnswerOutcome::Recorded);
        assert_eq!(session.unanswered_count(), 1);
    }

    #[test]
    fn two_of_three_correct_scores_two_thirds() {
        let mut session = active_session(build_config(), 3);
        let ids: Vec<QuestionId> = session.question_order().to_vec();
        session.set_answer(ids[0], AnswerValue::value("right")).unwrap();
        session.set_answer(ids[1], AnswerValue::value("wrong")).unwrap();
        session.set_answer(ids[2], AnswerValue::value("right")).unwrap();

        session.begin_submission(SubmitTrigger::Manual);
        let record = session.build_score_record(&user(), fixed_now()).unwrap();

        assert_eq!(record.raw_score(), 2);
        assert_eq!(record.final_score(), 2);
        assert_eq!(record.total_points(), 3);
        assert!((record.percentage() - 66.666_666).abs() < 0.001);
        assert_eq!(record.tamper_count(), 0);
        assert_eq!(record.question_order(), ids.as_slice());
    }

    #[test]
    fn penalty_is_subtracted_and_clamped() {
        let mut session = active_session(build_config(), 3);
        let ids: Vec<QuestionId> = session.question_order().to_vec();
        session.set_answer(ids[0], AnswerValue::value("right")).unwrap();

        // three focus losses: warning, +2, +3
        session.report_focus_loss();
        session.report_focus_loss();
        session.report_focus_loss();
        assert_eq!(session.penalty_points(), 5);

        session.begin_submission(SubmitTrigger::Manual);
        let record = session.build_score_record(&user(), fixed_now()).unwrap();
        assert_eq!(record.raw_score(), 1);
        assert_eq!(record.final_score(), 0); // max(0, 1 - 5)
        assert_eq!(record.percentage(), 0.0);
    }

    #[test]
    fn survey_has_no_clock_no_monitor_no_score() {
        let config = QuizSetConfig::new(QuizSetId::new(2), "Poll", 30)
            .unwrap()
            .as_survey();
        let mut session = active_session(config, 5);

        assert_eq!(session.remaining_seconds(), None);
        assert_eq!(session.tick(), ClockEvent::Idle);
        assert_eq!(session.report_focus_loss(), IntegrityAction::Ignored);
        assert_eq!(session.tamper_count(), 0);

        for id in session.question_order().to_vec() {
            session.set_answer(id, AnswerValue::value("right")).unwrap();
        }
        session.begin_submission(SubmitTrigger::Manual);
        let record = session.build_score_record(&user(), fixed_now()).unwrap();
        assert_eq!(record.raw_score(), 0);
        assert_eq!(record.total_points(), 0);
        assert_eq!(record.percentage(), 0.0);
    }

    #[test]
    fn tamper_escalation_is_deterministic() {
        let mut session = active_session(build_config(), 2);

        assert_eq!(session.report_focus_loss(), IntegrityAction::Warning);
        assert_eq!(
            session.report_focus_loss(),
            IntegrityAction::Penalty { added: 2, total: 2 }
        );
        assert_eq!(
            session.report_focus_loss(),
            IntegrityAction::Penalty { added: 3, total: 5 }
        );
        assert_eq!(session.report_focus_loss(), IntegrityAction::ForceSubmit);

        // the force-submit trigger engages the guard
        assert!(session.begin_submission(SubmitTrigger::Integrity));
        // a fifth event during finalization has no effect
        assert_eq!(session.report_focus_loss(), IntegrityAction::Ignored);
        assert_eq!(session.tamper_count(), 4);
        assert_eq!(session.penalty_points(), 5);
    }

    #[test]
    fn ticks_are_inert_once_submitting() {
        let mut session = active_session(build_config(), 2);
        assert!(matches!(session.tick(), ClockEvent::Tick { .. }));
        session.begin_submission(SubmitTrigger::Manual);
        assert_eq!(session.tick(), ClockEvent::Idle);
    }

    #[test]
    fn score_record_building_requires_the_guard() {
        let session = active_session(build_config(), 2);
        let err = session.build_score_record(&user(), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::InvalidPhase(SessionPhase::Active)));
    }
}
