//! Public status DTO

use serde::{Deserialize, Serialize};

/// Response for the unauthenticated `GET /status` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub mode: String,
    pub tunnels: Vec<String>,
    /// Count of active worker credentials
    pub workers: usize,
    pub pipeline_runs: RunCounts,
}

/// Aggregate run counters for the status surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCounts {
    pub total: usize,
    pub completed: usize,
}
