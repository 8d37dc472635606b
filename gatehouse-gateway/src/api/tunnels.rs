//! Tunnel API Handlers
//!
//! Orchestrator endpoints for tunnel management.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use gatehouse_core::domain::tunnel::Tunnel;
use gatehouse_core::dto::tunnel::{CreateTunnel, DeleteTunnel, UpdateTunnel};

use crate::api::error::{ApiError, ApiResult, require_json};
use crate::service::tunnel::TunnelError;
use crate::service::tunnel_service;
use crate::state::AppState;

/// GET /orchestrator/tunnels
/// List all tunnels
pub async fn list_tunnels(State(state): State<AppState>) -> ApiResult<Json<Vec<Tunnel>>> {
    tracing::debug!("Listing tunnels");

    Ok(Json(tunnel_service::list_tunnels(&state.tunnels).await))
}

/// POST /orchestrator/tunnels/create
/// Create a new tunnel
pub async fn create_tunnel(
    State(state): State<AppState>,
    body: Result<Json<CreateTunnel>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Tunnel>)> {
    let req = require_json(body)?;

    tracing::info!("Creating tunnel: {}", req.name);

    let tunnel = tunnel_service::create_tunnel(&state.tunnels, req)
        .await
        .map_err(|e| match e {
            TunnelError::NotFound(name) => {
                ApiError::NotFound(format!("Tunnel '{}' not found", name))
            }
            TunnelError::Validation(msg) => ApiError::BadRequest(msg),
            TunnelError::Storage(err) => ApiError::Storage(err),
        })?;

    Ok((StatusCode::CREATED, Json(tunnel)))
}

/// POST /orchestrator/tunnels/update
/// Shallow-merge update of an existing tunnel
pub async fn update_tunnel(
    State(state): State<AppState>,
    body: Result<Json<UpdateTunnel>, JsonRejection>,
) -> ApiResult<Json<Tunnel>> {
    let req = require_json(body)?;

    tracing::info!("Updating tunnel: {}", req.name);

    let tunnel = tunnel_service::update_tunnel(&state.tunnels, req)
        .await
        .map_err(|e| match e {
            TunnelError::NotFound(name) => {
                ApiError::NotFound(format!("Tunnel '{}' not found", name))
            }
            TunnelError::Validation(msg) => ApiError::BadRequest(msg),
            TunnelError::Storage(err) => ApiError::Storage(err),
        })?;

    Ok(Json(tunnel))
}

/// POST /orchestrator/tunnels/delete
/// Delete a tunnel by name
pub async fn delete_tunnel(
    State(state): State<AppState>,
    body: Result<Json<DeleteTunnel>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let req = require_json(body)?;

    tracing::info!("Deleting tunnel: {}", req.name);

    tunnel_service::delete_tunnel(&state.tunnels, &req.name)
        .await
        .map_err(|e| match e {
            TunnelError::NotFound(name) => {
                ApiError::NotFound(format!("Tunnel '{}' not found", name))
            }
            TunnelError::Validation(msg) => ApiError::BadRequest(msg),
            TunnelError::Storage(err) => ApiError::Storage(err),
        })?;

    Ok(Json(serde_json::json!({ "success": true })))
}
