use serde::Serialize;

use super::service::SessionPhase;

/// Aggregated view of session state, useful for UI rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub remaining_seconds: Option<u32>,
    pub tamper_count: u32,
    pub penalty_points: u32,
    pub phase: SessionPhase,
}
