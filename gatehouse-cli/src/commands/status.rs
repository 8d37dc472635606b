//! Status command handler

use anyhow::Result;
use colored::*;

use crate::config::Config;
use gatehouse_client::GatehouseClient;

/// Handle the status command
pub async fn handle_status_command(config: &Config) -> Result<()> {
    let client = GatehouseClient::new(&config.url, &config.api_key);
    let status = client.status().await?;

    println!("{} {}", "Gateway:".bold(), status.status.green());
    println!("  Mode:    {}", status.mode);
    println!(
        "  Tunnels: {}",
        if status.tunnels.is_empty() {
            "-".to_string()
        } else {
            status.tunnels.join(", ")
        }
    );
    println!("  Workers: {}", status.workers);
    println!(
        "  Runs:    {} total, {} completed",
        status.pipeline_runs.total, status.pipeline_runs.completed
    );

    Ok(())
}
