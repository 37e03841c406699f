use thiserror::Error;

use crate::model::{QuestionError, QuizSetError, ScoreRecordError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    QuizSet(#[from] QuizSetError),
    #[error(transparent)]
    ScoreRecord(#[from] ScoreRecordError),
}
