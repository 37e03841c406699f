mod answer;
mod ids;
mod question;
mod quiz_set;
mod score_record;
mod user;

pub use ids::{ParseIdError, QuestionId, QuizSetId};

pub use answer::AnswerValue;
pub use question::{CorrectAnswer, Question, QuestionError, QuestionKind};
pub use quiz_set::{QuizSetConfig, QuizSetError};
pub use score_record::{ScoreRecord, ScoreRecordError};
pub use user::UserIdentity;
