//! Worker Validation Handler
//!
//! The catch-all surface workers hit: every authenticated request that is
//! not an orchestrator route lands here and is policy-evaluated against
//! the caller's tunnel.

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use gatehouse_core::domain::policy::DenialKind;
use gatehouse_core::dto::decision::{AllowResponse, DenialResponse, PipelineAdvance};

use crate::auth::Caller;
use crate::repository::tunnels::DEFAULT_TUNNEL;
use crate::service::policy::{self, Evaluation};
use crate::service::run::SubmitError;
use crate::service::run_service;
use crate::state::AppState;

/// Upper bound on a buffered request body
const BODY_LIMIT: usize = 1024 * 1024;

/// Fallback handler for the worker surface
pub async fn validate(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    req: Request,
) -> Response {
    evaluate_request(state, caller, req).await
}

/// Policy-evaluate a request against the caller's tunnel. Also invoked by
/// the orchestrator gate for non-orchestrator callers on admin paths.
pub async fn evaluate_request(state: AppState, caller: Caller, req: Request) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let tunnel_name = caller
        .tunnel
        .clone()
        .unwrap_or_else(|| DEFAULT_TUNNEL.to_string());

    let tunnel = state.tunnels.snapshot(&tunnel_name).await;

    let body = if method == Method::POST || method == Method::PUT {
        match to_bytes(req.into_body(), BODY_LIMIT).await {
            Ok(bytes) => Some(bytes),
            Err(_) => return deny(&DenialKind::BodyReadError, &tunnel_name, &caller.name),
        }
    } else {
        None
    };

    match policy::evaluate(tunnel.as_ref(), method.as_str(), &path, body.as_deref()) {
        Err(kind) => deny(&kind, &tunnel_name, &caller.name),
        Ok(Evaluation::Allowed { command }) => {
            tracing::debug!(
                "Allowed {} {} for agent '{}' on tunnel '{}'",
                method,
                path,
                caller.name,
                tunnel_name
            );
            (
                StatusCode::OK,
                Json(AllowResponse::new(tunnel_name, caller.name, command)),
            )
                .into_response()
        }
        Ok(Evaluation::Pipeline {
            run_id,
            run_id_raw,
            command,
        }) => {
            let Some(run_id) = run_id else {
                return deny(
                    &DenialKind::RunNotFound(run_id_raw),
                    &tunnel_name,
                    &caller.name,
                );
            };

            match run_service::submit_step(&state.runs, &state.tunnels, run_id, &command).await {
                Ok(advance) => (
                    StatusCode::OK,
                    Json(PipelineAdvance {
                        success: true,
                        tunnel: tunnel_name,
                        agent: caller.name,
                        run_id: advance.run_id,
                        step_number: advance.step_number,
                        command: advance.command,
                        run_status: advance.run_status,
                        next_command: advance.next_command,
                    }),
                )
                    .into_response(),
                Err(e) => {
                    if let SubmitError::Storage(ref err) = e {
                        tracing::error!("Storage error during step submission: {}", err);
                    }
                    match e.into_denial() {
                        Some(kind) => deny(&kind, &tunnel_name, &caller.name),
                        None => (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(serde_json::json!({ "error": "Internal server error" })),
                        )
                            .into_response(),
                    }
                }
            }
        }
    }
}

fn deny(kind: &DenialKind, tunnel: &str, agent: &str) -> Response {
    tracing::debug!("Denied request for agent '{}': {}", agent, kind.reason());

    (
        StatusCode::FORBIDDEN,
        Json(DenialResponse::from_kind(
            kind,
            tunnel.to_string(),
            agent.to_string(),
        )),
    )
        .into_response()
}
