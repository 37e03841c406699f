use chrono::{DateTime, Utc};
use std::sync::Arc;

use exam_core::model::QuizSetId;
use storage::repository::ScoreRecordRepository;

use crate::error::SessionError;

/// Storage id of a persisted score record.
pub type ScoreRecordId = i64;

/// Row shape for listing completed attempts in a report table.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecordListItem {
    pub record_id: ScoreRecordId,
    pub user_id: String,
    pub display_name: String,
    pub department: String,
    pub final_score: u32,
    pub total_points: u32,
    pub percentage: f64,
    pub tamper_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Read-side access to persisted score records for review screens.
#[derive(Clone)]
pub struct ScoreRecordService {
    records: Arc<dyn ScoreRecordRepository>,
}

impl ScoreRecordService {
    #[must_use]
    pub fn new(records: Arc<dyn ScoreRecordRepository>) -> Self {
        Self { records }
    }

    /// List completed attempts for a quiz set, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on storage failure.
    pub async fn records_for_set(
        &self,
        quiz_set_id: QuizSetId,
    ) -> Result<Vec<ScoreRecordListItem>, SessionError> {
        let rows = self.records.records_for_set(quiz_set_id).await?;
        Ok(rows
            .into_iter()
            .map(|(record_id, record)| ScoreRecordListItem {
                record_id,
                user_id: record.user().id.clone(),
                display_name: record.user().display_name.clone(),
                department: record.user().department.clone(),
                final_score: record.final_score(),
                total_points: record.total_points(),
                percentage: record.percentage(),
                tamper_count: record.tamper_count(),
                created_at: record.created_at(),
            })
            .collect())
    }
}
