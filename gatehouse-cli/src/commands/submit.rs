//! Submit command handler
//!
//! Drives the worker surface: submits a command (optionally against a
//! pipeline run) and prints the gateway's decision.

use anyhow::Result;
use colored::*;
use gatehouse_client::ClientError;

use crate::config::Config;
use gatehouse_client::GatehouseClient;

/// Handle the submit command
pub async fn handle_submit_command(
    config: &Config,
    command: &str,
    run_id: Option<u64>,
    path: &str,
) -> Result<()> {
    let client = GatehouseClient::new(&config.url, &config.api_key);

    let mut payload = serde_json::json!({ "command": command });
    if let Some(run_id) = run_id {
        payload["run_id"] = run_id.into();
    }

    match client.submit_payload(path, &payload).await {
        Ok(decision) => {
            println!("{}", "✓ Allowed".green().bold());
            if let Some(next) = decision.get("next_command") {
                if next.is_null() {
                    println!("  {}", "Pipeline completed.".green());
                } else if let Some(next) = next.as_str() {
                    println!("  Next command: {}", next.cyan());
                }
            }
            println!("{}", serde_json::to_string_pretty(&decision)?.dimmed());
            Ok(())
        }
        Err(ClientError::ApiError { status: 403, message }) => {
            println!("{}", "✗ Denied".red().bold());
            println!("{}", message);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
