//! Run command handlers
//!
//! Starts, inspects, and aborts pipeline runs.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use gatehouse_core::domain::run::{PipelineRun, RunStatus};

use crate::config::Config;
use gatehouse_client::GatehouseClient;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// Start a run on a pipeline tunnel
    Start {
        /// Pipeline tunnel name
        #[arg(short, long)]
        pipeline: String,

        /// Agent name recorded on the run
        #[arg(short, long)]
        agent: String,
    },
    /// Show a run by id
    Status {
        /// Run id
        run_id: u64,
    },
    /// List all runs
    List,
    /// Abort a run
    Reset {
        /// Run id
        run_id: u64,
    },
}

/// Handle run commands
pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    let client = GatehouseClient::new(&config.url, &config.api_key);

    match command {
        RunCommands::Start { pipeline, agent } => start_run(&client, &pipeline, &agent).await,
        RunCommands::Status { run_id } => run_status(&client, run_id).await,
        RunCommands::List => list_runs(&client).await,
        RunCommands::Reset { run_id } => reset_run(&client, run_id).await,
    }
}

/// Start a run
async fn start_run(client: &GatehouseClient, pipeline: &str, agent: &str) -> Result<()> {
    let started = client.start_run(pipeline, agent).await?;

    println!("{}", "✓ Pipeline run started!".green().bold());
    println!("  Run id:   {}", started.run_id.to_string().cyan());
    println!("  Pipeline: {}", started.pipeline.bold());
    println!(
        "  Steps:    {}",
        started.total_steps.to_string().dimmed()
    );
    println!("  Next:     {}", started.next_command.cyan());

    Ok(())
}

/// Show one run
async fn run_status(client: &GatehouseClient, run_id: u64) -> Result<()> {
    let run = client.run_status(run_id).await?;
    print_run(&run);
    Ok(())
}

/// List all runs
async fn list_runs(client: &GatehouseClient) -> Result<()> {
    let runs = client.list_runs().await?;

    if runs.is_empty() {
        println!("{}", "No pipeline runs found.".yellow());
    } else {
        println!("{}", format!("Found {} run(s):", runs.len()).bold());
        println!();
        for run in runs {
            print_run(&run);
        }
    }

    Ok(())
}

/// Abort a run
async fn reset_run(client: &GatehouseClient, run_id: u64) -> Result<()> {
    let run = client.reset_run(run_id).await?;

    println!(
        "{}",
        format!("✓ Pipeline run {} aborted.", run.run_id)
            .green()
            .bold()
    );

    Ok(())
}

fn print_run(run: &PipelineRun) {
    let status = match run.status {
        RunStatus::InProgress => "in_progress".cyan(),
        RunStatus::Completed => "completed".green(),
        RunStatus::Aborted => "aborted".yellow(),
        RunStatus::Failed => "failed".red(),
    };

    println!(
        "  {} {} [{}]",
        format!("#{}", run.run_id).cyan().bold(),
        run.pipeline.bold(),
        status
    );
    println!(
        "    Agent: {}  Started: {}",
        run.agent,
        run.started_at.to_rfc3339().dimmed()
    );
    for step in &run.steps_completed {
        println!(
            "    {} {} {}",
            format!("{}.", step.step_number).dimmed(),
            step.command,
            "✓".green()
        );
    }
    println!();
}
