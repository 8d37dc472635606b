//! Policy denial vocabulary
//!
//! Every way the gateway can refuse a request, with the stable wire code
//! and the human-readable reason each one carries. Both the gateway and
//! clients interpreting 403 bodies share this vocabulary.

use crate::domain::run::RunStatus;

/// Why a request was denied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialKind {
    /// The caller's tunnel does not exist in the registry
    TunnelUnknown,
    MethodNotAllowed(String),
    PathNotAllowed(String),
    BadJson,
    BodyReadError,
    /// Strict mode with an empty command whitelist
    StrictModeEmpty,
    CommandNotWhitelisted(String),
    ForbiddenKeyword(String),
    /// Carries the run id as presented by the caller
    RunNotFound(String),
    RunAlreadyCompleted,
    RunTerminal(RunStatus),
    /// The tunnel was removed or its pipeline definition dropped mid-run
    ConfigGone,
    /// current_step walked past the end of a shrunken pipeline
    StepsExhausted,
    WrongStep { expected: String, received: String },
}

impl DenialKind {
    /// Stable machine-readable code for the 403 body's `error` field
    pub fn code(&self) -> &'static str {
        match self {
            DenialKind::TunnelUnknown => "tunnel_unknown",
            DenialKind::MethodNotAllowed(_) => "method_not_allowed",
            DenialKind::PathNotAllowed(_) => "path_not_allowed",
            DenialKind::BadJson => "bad_json",
            DenialKind::BodyReadError => "body_read_error",
            DenialKind::StrictModeEmpty => "strict_mode_empty",
            DenialKind::CommandNotWhitelisted(_) => "command_not_whitelisted",
            DenialKind::ForbiddenKeyword(_) => "forbidden_keyword",
            DenialKind::RunNotFound(_) => "pipeline_run_missing",
            DenialKind::RunAlreadyCompleted
            | DenialKind::RunTerminal(_)
            | DenialKind::StepsExhausted => "pipeline_terminal",
            DenialKind::ConfigGone => "pipeline_config_gone",
            DenialKind::WrongStep { .. } => "pipeline_wrong_step",
        }
    }

    /// Human-readable reason for the 403 body's `reason` field
    pub fn reason(&self) -> String {
        match self {
            DenialKind::TunnelUnknown => "Invalid Tunnel Config".to_string(),
            DenialKind::MethodNotAllowed(method) => format!("Method {} not allowed", method),
            DenialKind::PathNotAllowed(path) => format!("Path {} not allowed", path),
            DenialKind::BadJson => "Invalid JSON payload".to_string(),
            DenialKind::BodyReadError => "Body read error".to_string(),
            DenialKind::StrictModeEmpty => "No commands allowed in strict mode".to_string(),
            DenialKind::CommandNotWhitelisted(cmd) => {
                format!("Command '{}' not in whitelist", cmd)
            }
            DenialKind::ForbiddenKeyword(kw) => format!("Forbidden keyword '{}' detected", kw),
            DenialKind::RunNotFound(id) => format!("Pipeline run '{}' not found", id),
            DenialKind::RunAlreadyCompleted => "Pipeline run already completed".to_string(),
            DenialKind::RunTerminal(RunStatus::Aborted) => "Pipeline run was aborted".to_string(),
            DenialKind::RunTerminal(RunStatus::Failed) => "Pipeline run failed".to_string(),
            DenialKind::RunTerminal(status) => {
                format!("Pipeline run is not accepting steps (status: {:?})", status)
            }
            DenialKind::ConfigGone => "Pipeline config no longer exists".to_string(),
            DenialKind::StepsExhausted => "All pipeline steps already completed".to_string(),
            DenialKind::WrongStep { expected, received } => {
                format!("Wrong step: expected '{}', received '{}'", expected, received)
            }
        }
    }

    /// The expected command, set iff the denial was a wrong-step mismatch
    pub fn expected_command(&self) -> Option<&str> {
        match self {
            DenialKind::WrongStep { expected, .. } => Some(expected),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_messages() {
        assert_eq!(
            DenialKind::MethodNotAllowed("DELETE".into()).reason(),
            "Method DELETE not allowed"
        );
        assert_eq!(
            DenialKind::CommandNotWhitelisted("rm -rf /".into()).reason(),
            "Command 'rm -rf /' not in whitelist"
        );
        assert_eq!(
            DenialKind::ForbiddenKeyword("sudo".into()).reason(),
            "Forbidden keyword 'sudo' detected"
        );
        assert_eq!(
            DenialKind::RunNotFound("42".into()).reason(),
            "Pipeline run '42' not found"
        );
    }

    #[test]
    fn test_expected_command_only_on_wrong_step() {
        let wrong = DenialKind::WrongStep {
            expected: "npm install".into(),
            received: "npm run build".into(),
        };
        assert_eq!(wrong.expected_command(), Some("npm install"));
        assert_eq!(DenialKind::BadJson.expected_command(), None);
    }
}
