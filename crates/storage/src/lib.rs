#![forbid(unsafe_code)]

pub mod repository;

pub use repository::{
    InMemoryRepository, QuestionRecord, QuestionRepository, QuizSetRepository,
    ScoreRecordRepository, Storage, StorageError,
};
