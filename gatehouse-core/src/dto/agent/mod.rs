//! Agent (worker credential) DTOs for the orchestrator API

use serde::{Deserialize, Serialize};

use crate::domain::credential::Tier;

/// Request to issue a new worker credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAgent {
    pub name: String,
    /// Tunnel the worker will be evaluated against; must exist.
    pub tunnel: String,
    /// Requests allowed per UTC day
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u64,
}

fn default_daily_limit() -> u64 {
    1000
}

/// Response to a successful credential issue
///
/// The only place the full key is ever returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentIssued {
    pub key: String,
    pub name: String,
    pub tunnel: String,
    pub daily_limit: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Worker credential as listed by the orchestrator API
///
/// The key is redacted to its first 8 characters plus an ellipsis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
    pub key: String,
    pub name: String,
    pub tier: Tier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel: Option<String>,
    pub daily_limit: u64,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub created_by: String,
}

/// Request to revoke a credential by its full key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteAgent {
    pub key: String,
}
