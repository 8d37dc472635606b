//! Pipeline run endpoints

use gatehouse_core::domain::run::PipelineRun;
use gatehouse_core::dto::run::{ResetRun, RunStarted, StartRun};

use crate::GatehouseClient;
use crate::error::Result;

impl GatehouseClient {
    // =============================================================================
    // Pipeline Runs
    // =============================================================================

    /// Begin a run on a pipeline tunnel
    pub async fn start_run(&self, pipeline: &str, agent: &str) -> Result<RunStarted> {
        let response = self
            .post("/orchestrator/pipeline/start")
            .json(&StartRun {
                pipeline: pipeline.to_string(),
                agent: agent.to_string(),
            })
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Query a run by id
    pub async fn run_status(&self, run_id: u64) -> Result<PipelineRun> {
        let response = self
            .get("/orchestrator/pipeline/status")
            .query(&[("run_id", run_id)])
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// List all runs
    pub async fn list_runs(&self) -> Result<Vec<PipelineRun>> {
        let response = self.get("/orchestrator/pipeline/runs").send().await?;
        self.handle_response(response).await
    }

    /// Abort a run
    pub async fn reset_run(&self, run_id: u64) -> Result<PipelineRun> {
        let response = self
            .post("/orchestrator/pipeline/reset")
            .json(&ResetRun { run_id })
            .send()
            .await?;
        self.handle_response(response).await
    }
}
