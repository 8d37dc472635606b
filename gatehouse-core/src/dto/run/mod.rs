//! Pipeline run DTOs for the orchestrator API

use serde::{Deserialize, Serialize};

/// Request to begin a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRun {
    /// Name of the pipeline tunnel to run
    pub pipeline: String,
    /// Informational agent name recorded on the run
    pub agent: String,
}

/// Response to a successful run start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStarted {
    pub run_id: u64,
    pub pipeline: String,
    pub agent: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// The first expected command
    pub next_command: String,
    pub total_steps: usize,
}

/// Request to abort a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetRun {
    pub run_id: u64,
}
