//! Agent API Handlers
//!
//! Orchestrator endpoints for worker credential management.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{Extension, Json};
use gatehouse_core::dto::agent::{AgentIssued, AgentSummary, CreateAgent, DeleteAgent};

use crate::api::error::{ApiError, ApiResult, require_json};
use crate::auth::Caller;
use crate::service::agent::AgentError;
use crate::service::agent_service;
use crate::state::AppState;

/// GET /orchestrator/agents
/// List worker credentials with keys redacted
pub async fn list_agents(State(state): State<AppState>) -> ApiResult<Json<Vec<AgentSummary>>> {
    tracing::debug!("Listing agents");

    Ok(Json(agent_service::list_agents(&state.credentials).await))
}

/// POST /orchestrator/agents/create
/// Issue a new worker credential
pub async fn create_agent(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Result<Json<CreateAgent>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AgentIssued>)> {
    let req = require_json(body)?;

    tracing::info!("Issuing agent credential '{}'", req.name);

    let issued = agent_service::issue_agent(&state.credentials, &state.tunnels, req, &caller.name)
        .await
        .map_err(|e| match e {
            AgentError::TunnelNotFound(name) => {
                ApiError::NotFound(format!("Tunnel '{}' not found", name))
            }
            AgentError::KeyNotFound => ApiError::NotFound("API key not found".to_string()),
            AgentError::Validation(msg) => ApiError::BadRequest(msg),
            AgentError::Storage(err) => ApiError::Storage(err),
        })?;

    Ok((StatusCode::CREATED, Json(issued)))
}

/// POST /orchestrator/agents/delete
/// Revoke a credential by its full key
pub async fn delete_agent(
    State(state): State<AppState>,
    body: Result<Json<DeleteAgent>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let req = require_json(body)?;

    agent_service::revoke_agent(&state.credentials, &req.key)
        .await
        .map_err(|e| match e {
            AgentError::KeyNotFound => ApiError::NotFound("API key not found".to_string()),
            AgentError::TunnelNotFound(name) => {
                ApiError::NotFound(format!("Tunnel '{}' not found", name))
            }
            AgentError::Validation(msg) => ApiError::BadRequest(msg),
            AgentError::Storage(err) => ApiError::Storage(err),
        })?;

    Ok(Json(serde_json::json!({ "success": true })))
}
