mod clock;
mod integrity;
mod plan;
mod progress;
mod queries;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use clock::{ClockEvent, CountdownClock};
pub use integrity::{IntegrityAction, IntegrityMonitor};
pub use plan::SessionPlan;
pub use progress::SessionProgress;
pub use queries::SessionQueries;
pub use service::{AnswerOutcome, ExamSession, SessionPhase, SubmitTrigger};
pub use view::{ScoreRecordId, ScoreRecordListItem, ScoreRecordService};
pub use workflow::{ExamLoopService, FocusLossOutcome, SubmitOutcome, SubmitReceipt, TickOutcome};
