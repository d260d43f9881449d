// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orch` — thin ops CLI for the worker-fleet orchestrator. Links
//! `orch-daemon`'s service in-process; there is no daemon/CLI IPC channel
//! (spec §9/§10 "Binaries").

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod color;
mod commands;
mod exit_error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use exit_error::ExitError;
use orch_daemon::OrchestratorService;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "orch", version = env!("BUILD_GIT_HASH"), styles = color::styles())]
struct Cli {
    /// Project directory providing the project-level config layer (spec §6)
    #[arg(long, global = true)]
    project: Option<PathBuf>,
    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect and control worker subprocesses
    Worker(commands::worker::WorkerArgs),
    /// Run a workflow against the fleet
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommand,
    },
    /// Inspect the machine-wide device registry
    Registry(commands::registry::RegistryArgs),
}

#[derive(Subcommand)]
enum WorkflowCommand {
    Run(commands::workflow::WorkflowRunArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(exit_err) = err.downcast_ref::<ExitError>() {
                eprintln!("{exit_err}");
                return ExitCode::from(exit_err.code as u8);
            }
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let service = OrchestratorService::new(cli.project).map_err(|e| anyhow::anyhow!("{e}"))?;

    match cli.command {
        Command::Worker(args) => commands::worker::handle(args.command, &service, cli.format).await?,
        Command::Workflow { command: WorkflowCommand::Run(args) } => {
            commands::workflow::handle(args, &service, cli.format).await?
        }
        Command::Registry(args) => commands::registry::handle(args.command, &service, cli.format).await?,
    }
    Ok(())
}
