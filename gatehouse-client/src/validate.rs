//! Worker validation and public status endpoints

use gatehouse_core::dto::status::StatusResponse;
use serde_json::Value;

use crate::GatehouseClient;
use crate::error::Result;

impl GatehouseClient {
    // =============================================================================
    // Worker Surface
    // =============================================================================

    /// Public gateway health and aggregates
    pub async fn status(&self) -> Result<StatusResponse> {
        let response = self.get("/status").send().await?;
        self.handle_response(response).await
    }

    /// Submit a command for policy evaluation
    ///
    /// Pass `run_id` to advance a pipeline run. A 200 means allowed; a
    /// policy denial surfaces as [`crate::ClientError::ApiError`] with
    /// status 403 and the denial body as the message.
    pub async fn submit_command(&self, command: &str, run_id: Option<u64>) -> Result<Value> {
        let mut payload = serde_json::json!({ "command": command });
        if let Some(run_id) = run_id {
            payload["run_id"] = run_id.into();
        }
        self.submit_payload("/validate", &payload).await
    }

    /// Submit an arbitrary payload to an arbitrary gateway path
    ///
    /// Tunnel path rules apply to the path actually requested, so callers
    /// exercising a path-constrained tunnel choose it here.
    pub async fn submit_payload(&self, path: &str, payload: &Value) -> Result<Value> {
        let response = self.post(path).json(payload).send().await?;
        self.handle_response(response).await
    }
}
