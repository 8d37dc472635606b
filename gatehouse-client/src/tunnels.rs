//! Tunnel administration endpoints

use gatehouse_core::domain::tunnel::Tunnel;
use gatehouse_core::dto::tunnel::{CreateTunnel, DeleteTunnel, UpdateTunnel};

use crate::GatehouseClient;
use crate::error::Result;

impl GatehouseClient {
    // =============================================================================
    // Tunnel Administration
    // =============================================================================

    /// List all tunnels
    pub async fn list_tunnels(&self) -> Result<Vec<Tunnel>> {
        let response = self.get("/orchestrator/tunnels").send().await?;
        self.handle_response(response).await
    }

    /// Create a new tunnel
    ///
    /// # Arguments
    /// * `req` - The tunnel creation request; omitted fields get defaults
    pub async fn create_tunnel(&self, req: CreateTunnel) -> Result<Tunnel> {
        let response = self
            .post("/orchestrator/tunnels/create")
            .json(&req)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Shallow-merge update of an existing tunnel
    pub async fn update_tunnel(&self, req: UpdateTunnel) -> Result<Tunnel> {
        let response = self
            .post("/orchestrator/tunnels/update")
            .json(&req)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Delete a tunnel by name
    pub async fn delete_tunnel(&self, name: &str) -> Result<serde_json::Value> {
        let response = self
            .post("/orchestrator/tunnels/delete")
            .json(&DeleteTunnel {
                name: name.to_string(),
            })
            .send()
            .await?;
        self.handle_response(response).await
    }
}
