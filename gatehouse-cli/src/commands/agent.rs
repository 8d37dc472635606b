//! Agent command handlers
//!
//! Issues, lists, and revokes worker credentials.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use gatehouse_core::dto::agent::CreateAgent;

use crate::config::Config;
use gatehouse_client::GatehouseClient;

/// Agent subcommands
#[derive(Subcommand)]
pub enum AgentCommands {
    /// List worker credentials (keys redacted)
    List,
    /// Issue a new worker credential
    Create {
        /// Agent name
        #[arg(short, long)]
        name: String,

        /// Tunnel the agent is evaluated against
        #[arg(short, long)]
        tunnel: String,

        /// Requests allowed per UTC day
        #[arg(long, default_value = "1000")]
        daily_limit: u64,
    },
    /// Revoke a credential by its full key
    Delete {
        /// The full API key
        key: String,
    },
}

/// Handle agent commands
pub async fn handle_agent_command(command: AgentCommands, config: &Config) -> Result<()> {
    let client = GatehouseClient::new(&config.url, &config.api_key);

    match command {
        AgentCommands::List => list_agents(&client).await,
        AgentCommands::Create {
            name,
            tunnel,
            daily_limit,
        } => create_agent(&client, name, tunnel, daily_limit).await,
        AgentCommands::Delete { key } => delete_agent(&client, &key).await,
    }
}

/// List worker credentials
async fn list_agents(client: &GatehouseClient) -> Result<()> {
    let agents = client.list_agents().await?;

    if agents.is_empty() {
        println!("{}", "No agents found.".yellow());
    } else {
        println!("{}", format!("Found {} agent(s):", agents.len()).bold());
        println!();
        for agent in agents {
            let active = if agent.active {
                "active".green()
            } else {
                "revoked".red()
            };
            println!(
                "  {} {} [{}]",
                agent.name.cyan().bold(),
                agent.key.dimmed(),
                active
            );
            println!(
                "    Tunnel: {}  Daily limit: {}",
                agent.tunnel.as_deref().unwrap_or("-"),
                agent.daily_limit.to_string().dimmed()
            );
        }
    }

    Ok(())
}

/// Issue a new worker credential
async fn create_agent(
    client: &GatehouseClient,
    name: String,
    tunnel: String,
    daily_limit: u64,
) -> Result<()> {
    let issued = client
        .create_agent(CreateAgent {
            name,
            tunnel,
            daily_limit,
        })
        .await?;

    println!("{}", "✓ Agent credential issued!".green().bold());
    println!("  Name:   {}", issued.name.bold());
    println!("  Tunnel: {}", issued.tunnel);
    println!("  Key:    {}", issued.key.cyan());
    println!();
    println!(
        "{}",
        "Store this key now; the gateway will only ever show it redacted.".yellow()
    );

    Ok(())
}

/// Revoke a credential
async fn delete_agent(client: &GatehouseClient, key: &str) -> Result<()> {
    client.delete_agent(key).await?;

    println!("{}", "✓ Credential revoked.".green().bold());

    Ok(())
}
