//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod agent;
mod run;
mod status;
mod submit;
mod tunnel;

pub use agent::AgentCommands;
pub use run::RunCommands;
pub use tunnel::TunnelCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Tunnel administration
    Tunnel {
        #[command(subcommand)]
        command: TunnelCommands,
    },
    /// Worker credential administration
    Agent {
        #[command(subcommand)]
        command: AgentCommands,
    },
    /// Pipeline run administration
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// Gateway health and aggregates
    Status,
    /// Submit a command for policy evaluation (worker surface)
    Submit {
        /// The command to validate
        command: String,

        /// Pipeline run to advance
        #[arg(long)]
        run_id: Option<u64>,

        /// Gateway path to submit against (tunnel path rules apply to it)
        #[arg(long, default_value = "/validate")]
        path: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Tunnel { command } => tunnel::handle_tunnel_command(command, config).await,
        Commands::Agent { command } => agent::handle_agent_command(command, config).await,
        Commands::Run { command } => run::handle_run_command(command, config).await,
        Commands::Status => status::handle_status_command(config).await,
        Commands::Submit {
            command,
            run_id,
            path,
        } => submit::handle_submit_command(config, &command, run_id, &path).await,
    }
}
