//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{QuestionId, ScoreRecordError};
use storage::repository::StorageError;

use crate::sessions::SessionPhase;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,

    #[error("operation not valid in phase {0:?}")]
    InvalidPhase(SessionPhase),

    #[error("question {0} is not part of this session")]
    UnknownQuestion(QuestionId),

    #[error(transparent)]
    Record(#[from] ScoreRecordError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
