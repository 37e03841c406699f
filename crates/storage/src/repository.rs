use async_trait::async_trait;
use exam_core::model::{
    CorrectAnswer, Question, QuestionError, QuestionId, QuestionKind, QuizSetConfig, QuizSetId,
    ScoreRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a question.
///
/// This mirrors the domain `Question` so repositories can
/// serialize/deserialize without leaking storage concerns into the domain
/// layer. `answer_values` is set for multi-choice questions, `answer_value`
/// for everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub kind: QuestionKind,
    pub prompt: String,
    pub image: Option<String>,
    pub options: Vec<String>,
    pub answer_value: Option<String>,
    pub answer_values: Option<Vec<String>>,
    pub points: u32,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        let (answer_value, answer_values) = match question.answer() {
            CorrectAnswer::Value(v) => (Some(v.clone()), None),
            CorrectAnswer::ValueSet(vs) => (None, Some(vs.iter().cloned().collect())),
        };

        Self {
            id: question.id(),
            kind: question.kind(),
            prompt: question.prompt().to_owned(),
            image: question.image().map(ToOwned::to_owned),
            options: question.options().to_vec(),
            answer_value,
            answer_values,
            points: question.points(),
        }
    }

    /// Convert the record back into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the stored shape fails domain validation.
    pub fn into_question(self) -> Result<Question, QuestionError> {
        let answer = match (self.answer_value, self.answer_values) {
            (Some(value), None) => CorrectAnswer::Value(value),
            (None, Some(values)) => CorrectAnswer::ValueSet(values.into_iter().collect()),
            _ => return Err(QuestionError::AnswerShapeMismatch),
        };

        let mut question = Question::new(self.id, self.kind, self.prompt, self.options, answer)?
            .with_points(self.points);
        if let Some(image) = self.image {
            question = question.with_image(image);
        }
        Ok(question)
    }
}

/// Repository contract for quiz-set configuration.
#[async_trait]
pub trait QuizSetRepository: Send + Sync {
    /// Persist or update a quiz-set configuration.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the configuration cannot be stored.
    async fn upsert_quiz_set(&self, config: &QuizSetConfig) -> Result<(), StorageError>;

    /// Fetch a quiz-set configuration by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_quiz_set(&self, id: QuizSetId) -> Result<QuizSetConfig, StorageError>;
}

/// Repository contract for question banks.
///
/// `questions_for_set` must return a stable snapshot for the duration of one
/// session; the engine treats the returned list as immutable.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Replace the question list of a quiz set.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the questions cannot be stored.
    async fn put_questions(
        &self,
        quiz_set_id: QuizSetId,
        questions: &[Question],
    ) -> Result<(), StorageError>;

    /// Fetch the questions of a quiz set in authoring order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the set has no questions, or other
    /// storage errors.
    async fn questions_for_set(&self, quiz_set_id: QuizSetId)
    -> Result<Vec<Question>, StorageError>;
}

/// Repository contract for completed-session score records.
#[async_trait]
pub trait ScoreRecordRepository: Send + Sync {
    /// Append a score record, returning its storage id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_record(&self, record: &ScoreRecord) -> Result<i64, StorageError>;

    /// List all records for a quiz set, newest first, with their storage ids.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn records_for_set(
        &self,
        quiz_set_id: QuizSetId,
    ) -> Result<Vec<(i64, ScoreRecord)>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    quiz_sets: Arc<Mutex<HashMap<QuizSetId, QuizSetConfig>>>,
    questions: Arc<Mutex<HashMap<QuizSetId, Vec<QuestionRecord>>>>,
    records: Arc<Mutex<Vec<(i64, ScoreRecord)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizSetRepository for InMemoryRepository {
    async fn upsert_quiz_set(&self, config: &QuizSetConfig) -> Result<(), StorageError> {
        let mut guard = self
            .quiz_sets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(config.id(), config.clone());
        Ok(())
    }

    async fn get_quiz_set(&self, id: QuizSetId) -> Result<QuizSetConfig, StorageError> {
        let guard = self
            .quiz_sets
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn put_questions(
        &self,
        quiz_set_id: QuizSetId,
        questions: &[Question],
    ) -> Result<(), StorageError> {
        let records = questions.iter().map(QuestionRecord::from_question).collect();
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(quiz_set_id, records);
        Ok(())
    }

    async fn questions_for_set(
        &self,
        quiz_set_id: QuizSetId,
    ) -> Result<Vec<Question>, StorageError> {
        let records = {
            let guard = self
                .questions
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            guard.get(&quiz_set_id).cloned().ok_or(StorageError::NotFound)?
        };

        records
            .into_iter()
            .map(|record| {
                record
                    .into_question()
                    .map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl ScoreRecordRepository for InMemoryRepository {
    async fn append_record(&self, record: &ScoreRecord) -> Result<i64, StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = i64::try_from(guard.len()).map_err(|_| StorageError::Conflict)? + 1;
        guard.push((id, record.clone()));
        Ok(id)
    }

    async fn records_for_set(
        &self,
        quiz_set_id: QuizSetId,
    ) -> Result<Vec<(i64, ScoreRecord)>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found: Vec<(i64, ScoreRecord)> = guard
            .iter()
            .filter(|(_, record)| record.quiz_set_id() == quiz_set_id)
            .cloned()
            .collect();
        found.sort_by_key(|(id, _)| std::cmp::Reverse(*id));
        Ok(found)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub quiz_sets: Arc<dyn QuizSetRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub records: Arc<dyn ScoreRecordRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let quiz_sets: Arc<dyn QuizSetRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let records: Arc<dyn ScoreRecordRepository> = Arc::new(repo);
        Self {
            quiz_sets,
            questions,
            records,
        }
    }
}
