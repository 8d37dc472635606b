//! Tunnel command handlers
//!
//! Handles tunnel creation, listing, and deletion against the gateway's
//! orchestrator API.

use anyhow::{Result, bail};
use clap::Subcommand;
use colored::*;
use gatehouse_core::domain::tunnel::{PipelineSpec, PipelineStep, Tunnel, WhitelistMode};
use gatehouse_core::dto::tunnel::CreateTunnel;

use crate::config::Config;
use gatehouse_client::GatehouseClient;

/// Tunnel subcommands
#[derive(Subcommand)]
pub enum TunnelCommands {
    /// List all tunnels
    List,
    /// Create a new tunnel
    Create {
        /// Tunnel name
        #[arg(short, long)]
        name: String,

        /// Human-readable description
        #[arg(short, long)]
        description: Option<String>,

        /// Allowed HTTP methods (comma-separated, "*" for all)
        #[arg(long, value_delimiter = ',')]
        methods: Vec<String>,

        /// Allowed path prefixes (comma-separated; empty allows all)
        #[arg(long, value_delimiter = ',')]
        paths: Vec<String>,

        /// Allowed command prefixes (comma-separated)
        #[arg(long, value_delimiter = ',')]
        commands: Vec<String>,

        /// Forbidden keywords (comma-separated, case-insensitive)
        #[arg(long, value_delimiter = ',')]
        keywords: Vec<String>,

        /// Whitelist mode: strict or lax
        #[arg(long, default_value = "strict")]
        mode: String,

        /// Pipeline step command; repeat in order to define a pipeline
        #[arg(long = "step")]
        steps: Vec<String>,
    },
    /// Delete a tunnel
    Delete {
        /// Tunnel name
        name: String,
    },
}

fn parse_mode(mode: &str) -> Result<WhitelistMode> {
    match mode {
        "strict" => Ok(WhitelistMode::Strict),
        "lax" => Ok(WhitelistMode::Lax),
        other => bail!("invalid whitelist mode '{}' (expected strict or lax)", other),
    }
}

/// Handle tunnel commands
pub async fn handle_tunnel_command(command: TunnelCommands, config: &Config) -> Result<()> {
    let client = GatehouseClient::new(&config.url, &config.api_key);

    match command {
        TunnelCommands::List => list_tunnels(&client).await,
        TunnelCommands::Create {
            name,
            description,
            methods,
            paths,
            commands,
            keywords,
            mode,
            steps,
        } => {
            create_tunnel(
                &client,
                name,
                description,
                methods,
                paths,
                commands,
                keywords,
                &mode,
                steps,
            )
            .await
        }
        TunnelCommands::Delete { name } => delete_tunnel(&client, &name).await,
    }
}

/// List all tunnels
async fn list_tunnels(client: &GatehouseClient) -> Result<()> {
    let tunnels = client.list_tunnels().await?;

    if tunnels.is_empty() {
        println!("{}", "No tunnels found.".yellow());
    } else {
        println!("{}", format!("Found {} tunnel(s):", tunnels.len()).bold());
        println!();
        for tunnel in tunnels {
            print_tunnel_summary(&tunnel);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn create_tunnel(
    client: &GatehouseClient,
    name: String,
    description: Option<String>,
    methods: Vec<String>,
    paths: Vec<String>,
    commands: Vec<String>,
    keywords: Vec<String>,
    mode: &str,
    steps: Vec<String>,
) -> Result<()> {
    let allowed_methods = if methods.is_empty() {
        vec!["GET".to_string(), "POST".to_string()]
    } else {
        methods
    };

    let pipeline = if steps.is_empty() {
        None
    } else {
        Some(PipelineSpec {
            steps: steps
                .into_iter()
                .map(|command| PipelineStep {
                    command,
                    description: None,
                })
                .collect(),
        })
    };

    let req = CreateTunnel {
        name,
        description,
        allowed_methods,
        allowed_paths: paths,
        allowed_commands: commands,
        forbidden_keywords: keywords,
        command_whitelist_mode: parse_mode(mode)?,
        pipeline,
    };

    let tunnel = client.create_tunnel(req).await?;

    println!("{}", "✓ Tunnel created successfully!".green().bold());
    print_tunnel_summary(&tunnel);

    Ok(())
}

/// Delete a tunnel
async fn delete_tunnel(client: &GatehouseClient, name: &str) -> Result<()> {
    client.delete_tunnel(name).await?;

    println!(
        "{}",
        format!("✓ Tunnel {} deleted successfully!", name)
            .green()
            .bold()
    );

    Ok(())
}

fn print_tunnel_summary(tunnel: &Tunnel) {
    let kind = if tunnel.is_pipeline() {
        "pipeline"
    } else {
        "policy"
    };

    println!("  {} {}", tunnel.name.cyan().bold(), format!("({})", kind).dimmed());
    println!("    Methods:  {}", tunnel.allowed_methods.join(", "));
    if !tunnel.allowed_paths.is_empty() {
        println!("    Paths:    {}", tunnel.allowed_paths.join(", ").dimmed());
    }
    if !tunnel.allowed_commands.is_empty() {
        println!(
            "    Commands: {}",
            tunnel.allowed_commands.join(", ").dimmed()
        );
    }
    if !tunnel.forbidden_keywords.is_empty() {
        println!(
            "    Keywords: {}",
            tunnel.forbidden_keywords.join(", ").red()
        );
    }
    if let Some(pipeline) = &tunnel.pipeline {
        println!("    Steps:");
        for (i, step) in pipeline.steps.iter().enumerate() {
            println!("      {}. {}", i + 1, step.command.dimmed());
        }
    }
    println!();
}
