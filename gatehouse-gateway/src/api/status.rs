//! Status API Handler
//!
//! Public health and aggregate endpoint.

use axum::Json;
use axum::extract::State;
use gatehouse_core::dto::status::{RunCounts, StatusResponse};

use crate::state::AppState;

/// GET /status
/// Server health, tunnel names, worker count, and run aggregates
pub async fn server_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let (total, completed) = state.runs.counts().await;

    Json(StatusResponse {
        status: "ok".to_string(),
        mode: "standalone".to_string(),
        tunnels: state.tunnels.names().await,
        workers: state.credentials.worker_count().await,
        pipeline_runs: RunCounts { total, completed },
    })
}
