//! Tunnel DTOs for the orchestrator API

use serde::{Deserialize, Serialize};

use crate::domain::tunnel::{PipelineSpec, WhitelistMode};

/// Request to create a new tunnel
///
/// Only `name` is required; every other field carries the documented
/// default when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTunnel {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,
    #[serde(default)]
    pub allowed_paths: Vec<String>,
    #[serde(default)]
    pub allowed_commands: Vec<String>,
    #[serde(default)]
    pub forbidden_keywords: Vec<String>,
    #[serde(default = "default_whitelist_mode")]
    pub command_whitelist_mode: WhitelistMode,
    #[serde(default)]
    pub pipeline: Option<PipelineSpec>,
}

fn default_allowed_methods() -> Vec<String> {
    vec!["GET".to_string(), "POST".to_string()]
}

fn default_whitelist_mode() -> WhitelistMode {
    WhitelistMode::Strict
}

/// Shallow-merge update for an existing tunnel
///
/// Fields left out of the request keep their current value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTunnel {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub allowed_methods: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_paths: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_commands: Option<Vec<String>>,
    #[serde(default)]
    pub forbidden_keywords: Option<Vec<String>>,
    #[serde(default)]
    pub command_whitelist_mode: Option<WhitelistMode>,
    #[serde(default)]
    pub pipeline: Option<PipelineSpec>,
}

/// Request to delete a tunnel by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTunnel {
    pub name: String,
}
