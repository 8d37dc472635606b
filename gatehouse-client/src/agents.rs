//! Agent credential endpoints

use gatehouse_core::dto::agent::{AgentIssued, AgentSummary, CreateAgent, DeleteAgent};

use crate::GatehouseClient;
use crate::error::Result;

impl GatehouseClient {
    // =============================================================================
    // Agent Credentials
    // =============================================================================

    /// List worker credentials (keys redacted by the gateway)
    pub async fn list_agents(&self) -> Result<Vec<AgentSummary>> {
        let response = self.get("/orchestrator/agents").send().await?;
        self.handle_response(response).await
    }

    /// Issue a new worker credential
    ///
    /// The returned key is shown in full exactly once; store it.
    pub async fn create_agent(&self, req: CreateAgent) -> Result<AgentIssued> {
        let response = self
            .post("/orchestrator/agents/create")
            .json(&req)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Revoke a credential by its full key
    pub async fn delete_agent(&self, key: &str) -> Result<serde_json::Value> {
        let response = self
            .post("/orchestrator/agents/delete")
            .json(&DeleteAgent {
                key: key.to_string(),
            })
            .send()
            .await?;
        self.handle_response(response).await
    }
}
