//! Pipeline run domain types

use serde::{Deserialize, Serialize};

/// Pipeline run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    Completed,
    Aborted,
    Failed,
}

impl RunStatus {
    /// Terminal runs reject all further step submissions
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::InProgress)
    }
}

/// One live instance of executing a pipeline
///
/// Owned by the gateway process; workers have read+advance-only access
/// gated by the expected-command check. Runs are never deleted, only
/// status-transitioned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: u64,
    /// Tunnel name captured at start time; the pipeline definition itself
    /// is late-bound from the registry on every submission.
    pub pipeline: String,
    pub agent: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Zero-based index of the next step to be validated.
    /// Always equals `steps_completed.len()`.
    pub current_step: usize,
    pub status: RunStatus,
    pub steps_completed: Vec<StepRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A confirmed pipeline step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// One-based position within the pipeline
    pub step_number: usize,
    pub command: String,
    pub confirmed_at: chrono::DateTime<chrono::Utc>,
}
