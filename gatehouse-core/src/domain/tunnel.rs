//! Tunnel domain types

use serde::{Deserialize, Serialize};

/// Command whitelist enforcement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhitelistMode {
    /// Body-bearing requests must match the allowed-command whitelist;
    /// an empty whitelist denies everything.
    Strict,
    /// The whitelist is not consulted; only forbidden keywords apply.
    Lax,
}

/// A named policy bundle constraining what callers assigned to it may do
///
/// Structure shared between the gateway (persists, enforces) and the
/// orchestrator surface (mutates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tunnel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// HTTP method tokens; may contain the wildcard "*"
    pub allowed_methods: Vec<String>,
    /// Path prefixes; an empty list means all paths are allowed
    pub allowed_paths: Vec<String>,
    /// Command prefixes consulted in strict mode
    pub allowed_commands: Vec<String>,
    /// Case-insensitive substrings that always deny
    pub forbidden_keywords: Vec<String>,
    pub command_whitelist_mode: WhitelistMode,
    /// Present iff this is a pipeline tunnel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineSpec>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Tunnel {
    /// Whether this tunnel carries a non-empty pipeline definition
    pub fn is_pipeline(&self) -> bool {
        self.pipeline
            .as_ref()
            .is_some_and(|p| !p.steps.is_empty())
    }
}

/// Ordered command sequence attached to a pipeline tunnel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub steps: Vec<PipelineStep>,
}

/// A single expected command within a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStep {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
