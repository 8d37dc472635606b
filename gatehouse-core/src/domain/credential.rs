//! Credential domain types

use serde::{Deserialize, Serialize};

/// Caller tier
///
/// Orchestrators administer the gateway; workers are policy-evaluated
/// against their assigned tunnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Orchestrator,
    Worker,
}

/// A caller credential
///
/// Stored keyed by its opaque API key; the key itself is the map key in the
/// credential file and is never embedded in the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub name: String,
    pub tier: Tier,
    /// Assigned tunnel. Required for workers, absent for orchestrators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel: Option<String>,
    pub daily_limit: u64,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub created_by: String,
}

impl Credential {
    /// Whether this credential belongs to an orchestrator-tier caller
    pub fn is_orchestrator(&self) -> bool {
        self.tier == Tier::Orchestrator
    }
}
