//! Gatehouse CLI
//!
//! Command-line interface for administering the Gatehouse gateway and
//! driving pipeline runs by hand.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "Gatehouse policy gateway CLI", long_about = None)]
struct Cli {
    /// Gateway URL
    #[arg(long, env = "GATEHOUSE_URL", default_value = "http://localhost:8080")]
    url: String,

    /// API key presented to the gateway
    #[arg(long, env = "GATEHOUSE_API_KEY")]
    api_key: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        url: cli.url,
        api_key: cli.api_key,
    };

    handle_command(cli.command, &config).await
}
