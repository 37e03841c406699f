#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use error::SessionError;

pub use sessions::{
    AnswerOutcome, ClockEvent, CountdownClock, ExamLoopService, ExamSession, FocusLossOutcome,
    IntegrityAction, IntegrityMonitor, ScoreRecordService, SessionPhase, SessionPlan,
    SessionProgress, SubmitOutcome, SubmitReceipt, SubmitTrigger, TickOutcome,
};
