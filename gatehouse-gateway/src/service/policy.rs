//! Policy Evaluator
//!
//! The non-pipeline decision path: given a tunnel snapshot and the shape
//! of an authenticated worker request, decide allow/deny. Checks run in a
//! fixed order and the first failure wins. This is a pure function of its
//! inputs; it never touches shared state, which is what makes identical
//! requests against identical snapshots yield identical decisions.

use gatehouse_core::domain::policy::DenialKind;
use gatehouse_core::domain::tunnel::{Tunnel, WhitelistMode};

/// Outcome of evaluation short of the pipeline state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Allowed {
        command: Option<String>,
    },
    /// The tunnel is pipeline-mode and the payload carried a `run_id`;
    /// the submission must be handed to the state machine.
    Pipeline {
        run_id: Option<u64>,
        run_id_raw: String,
        command: String,
    },
}

/// Evaluate a worker request against its tunnel
///
/// `path` must already have the query string stripped. `body` is consulted
/// only for POST and PUT.
pub fn evaluate(
    tunnel: Option<&Tunnel>,
    method: &str,
    path: &str,
    body: Option<&[u8]>,
) -> Result<Evaluation, DenialKind> {
    let Some(tunnel) = tunnel else {
        return Err(DenialKind::TunnelUnknown);
    };

    if !method_allowed(&tunnel.allowed_methods, method) {
        return Err(DenialKind::MethodNotAllowed(method.to_string()));
    }

    if !path_allowed(&tunnel.allowed_paths, path) {
        return Err(DenialKind::PathNotAllowed(path.to_string()));
    }

    if !method.eq_ignore_ascii_case("POST") && !method.eq_ignore_ascii_case("PUT") {
        return Ok(Evaluation::Allowed { command: None });
    }

    let payload: serde_json::Value = match body.and_then(|b| serde_json::from_slice(b).ok()) {
        Some(v) => v,
        None => return Err(DenialKind::BadJson),
    };

    // The one level at which intent can be compared to a whitelist
    // without executing the operation: command, or url, or nothing.
    let command = payload
        .get("command")
        .and_then(|v| v.as_str())
        .or_else(|| payload.get("url").and_then(|v| v.as_str()))
        .unwrap_or("")
        .to_string();

    if tunnel.pipeline.is_some() {
        if let Some(raw) = payload.get("run_id") {
            let run_id = raw
                .as_u64()
                .or_else(|| raw.as_str().and_then(|s| s.trim().parse().ok()));
            let run_id_raw = raw
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| raw.to_string());
            return Ok(Evaluation::Pipeline {
                run_id,
                run_id_raw,
                command,
            });
        }
    }

    if tunnel.command_whitelist_mode == WhitelistMode::Strict {
        if tunnel.allowed_commands.is_empty() {
            return Err(DenialKind::StrictModeEmpty);
        }
        if !command_whitelisted(&tunnel.allowed_commands, &command) {
            return Err(DenialKind::CommandNotWhitelisted(command));
        }
    }

    if let Some(keyword) = find_forbidden_keyword(&tunnel.forbidden_keywords, &command) {
        return Err(DenialKind::ForbiddenKeyword(keyword));
    }

    let command = if command.is_empty() {
        None
    } else {
        Some(command)
    };
    Ok(Evaluation::Allowed { command })
}

fn method_allowed(allowed: &[String], method: &str) -> bool {
    allowed
        .iter()
        .any(|m| m == "*" || m.eq_ignore_ascii_case(method))
}

fn path_allowed(prefixes: &[String], path: &str) -> bool {
    prefixes.is_empty() || prefixes.iter().any(|p| path.starts_with(p.as_str()))
}

/// A command is whitelisted iff it equals an allowed prefix exactly or
/// extends one with a space. The space guard keeps `ls-evil` from riding
/// on an allow-`ls` policy while still permitting `ls -la`.
fn command_whitelisted(allowed: &[String], command: &str) -> bool {
    let command = command.trim();
    allowed.iter().any(|c| {
        let prefix = c.trim();
        command == prefix || command.starts_with(&format!("{} ", prefix))
    })
}

fn find_forbidden_keyword(keywords: &[String], command: &str) -> Option<String> {
    let haystack = command.to_lowercase();
    keywords
        .iter()
        .filter(|kw| !kw.is_empty())
        .find(|kw| haystack.contains(&kw.to_lowercase()))
        .cloned()
}
