//! Decision envelopes returned by the worker validation surface

use serde::{Deserialize, Serialize};

use crate::domain::policy::DenialKind;
use crate::domain::run::RunStatus;

/// 200 body for an allowed non-pipeline request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowResponse {
    pub success: bool,
    pub message: String,
    pub tunnel: String,
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl AllowResponse {
    pub fn new(tunnel: String, agent: String, command: Option<String>) -> Self {
        Self {
            success: true,
            message: "Request allowed".to_string(),
            tunnel,
            agent,
            command,
        }
    }
}

/// 200 body for a confirmed pipeline step
///
/// `next_command` is serialized as an explicit null once the run completes,
/// so a well-behaved caller needs no extra round-trip to learn it is done.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineAdvance {
    pub success: bool,
    pub tunnel: String,
    pub agent: String,
    pub run_id: u64,
    /// One-based number of the step just confirmed
    pub step_number: usize,
    pub command: String,
    pub run_status: RunStatus,
    pub next_command: Option<String>,
}

/// 403 body for any policy denial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenialResponse {
    /// Stable machine-readable code (see [`DenialKind::code`])
    pub error: String,
    /// Human-readable reason naming the rule that rejected the request
    pub reason: String,
    pub tunnel: String,
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_command: Option<String>,
}

impl DenialResponse {
    pub fn from_kind(kind: &DenialKind, tunnel: String, agent: String) -> Self {
        Self {
            error: kind.code().to_string(),
            reason: kind.reason(),
            tunnel,
            agent,
            expected_command: kind.expected_command().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_carries_expected_command() {
        let kind = DenialKind::WrongStep {
            expected: "npm install".into(),
            received: "npm run build".into(),
        };
        let body = DenialResponse::from_kind(&kind, "Deploy".into(), "ci-bot".into());
        assert_eq!(body.error, "pipeline_wrong_step");
        assert_eq!(body.expected_command.as_deref(), Some("npm install"));
    }

    #[test]
    fn test_completed_advance_serializes_null_next() {
        let advance = PipelineAdvance {
            success: true,
            tunnel: "Deploy".into(),
            agent: "ci-bot".into(),
            run_id: 3,
            step_number: 4,
            command: "pm2 restart shortshub".into(),
            run_status: RunStatus::Completed,
            next_command: None,
        };
        let json = serde_json::to_value(&advance).unwrap();
        assert_eq!(json["run_status"], "completed");
        assert!(json["next_command"].is_null());
    }
}
