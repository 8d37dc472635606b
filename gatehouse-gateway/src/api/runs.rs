//! Pipeline Run API Handlers
//!
//! Orchestrator endpoints for the run lifecycle.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use gatehouse_core::domain::run::PipelineRun;
use gatehouse_core::dto::run::{ResetRun, RunStarted, StartRun};
use serde::Deserialize;

use crate::api::error::{ApiError, ApiResult, require_json, require_query};
use crate::service::run::RunError;
use crate::service::run_service;
use crate::state::AppState;

fn map_run_error(e: RunError) -> ApiError {
    match e {
        RunError::TunnelNotFound(name) => ApiError::NotFound(format!("Tunnel '{}' not found", name)),
        RunError::NotAPipeline(name) => {
            ApiError::BadRequest(format!("Tunnel '{}' has no pipeline", name))
        }
        RunError::RunNotFound(id) => ApiError::NotFound(format!("Pipeline run '{}' not found", id)),
        RunError::NotInProgress(id) => {
            ApiError::BadRequest(format!("Pipeline run '{}' is not in progress", id))
        }
        RunError::Storage(err) => ApiError::Storage(err),
    }
}

/// POST /orchestrator/pipeline/start
/// Begin a run on a pipeline tunnel
pub async fn start_run(
    State(state): State<AppState>,
    body: Result<Json<StartRun>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RunStarted>)> {
    let req = require_json(body)?;

    tracing::info!("Starting pipeline run on '{}'", req.pipeline);

    let started = run_service::start_run(&state.runs, &state.tunnels, req)
        .await
        .map_err(map_run_error)?;

    Ok((StatusCode::CREATED, Json(started)))
}

#[derive(Debug, Deserialize)]
pub struct RunStatusQuery {
    pub run_id: u64,
}

/// GET /orchestrator/pipeline/status?run_id=X
/// Query a run by id
pub async fn run_status(
    State(state): State<AppState>,
    query: Result<Query<RunStatusQuery>, QueryRejection>,
) -> ApiResult<Json<PipelineRun>> {
    let params = require_query(query)?;

    tracing::debug!("Getting pipeline run: {}", params.run_id);

    let run = run_service::get_run(&state.runs, params.run_id)
        .await
        .map_err(map_run_error)?;

    Ok(Json(run))
}

/// GET /orchestrator/pipeline/runs
/// List all runs
pub async fn list_runs(State(state): State<AppState>) -> ApiResult<Json<Vec<PipelineRun>>> {
    tracing::debug!("Listing pipeline runs");

    Ok(Json(run_service::list_runs(&state.runs).await))
}

/// POST /orchestrator/pipeline/reset
/// Abort a run
pub async fn reset_run(
    State(state): State<AppState>,
    body: Result<Json<ResetRun>, JsonRejection>,
) -> ApiResult<Json<PipelineRun>> {
    let req = require_json(body)?;

    tracing::info!("Aborting pipeline run: {}", req.run_id);

    let run = run_service::abort_run(&state.runs, req.run_id)
        .await
        .map_err(map_run_error)?;

    Ok(Json(run))
}
