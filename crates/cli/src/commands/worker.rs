// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orch worker` — list and stop worker subprocesses (spec §4.1, §4.2, §5).

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use orch_core::ProfileId;
use orch_daemon::OrchestratorService;

use crate::color;
use crate::output::{format_time_ago, handle_list, OutputFormat};

#[derive(Args)]
pub struct WorkerArgs {
    #[command(subcommand)]
    pub command: WorkerCommand,
}

#[derive(Subcommand)]
pub enum WorkerCommand {
    /// List workers recorded in the machine-wide device registry
    List,
    /// Stop a running worker by profile id
    Stop {
        /// Profile id the worker was spawned for
        profile_id: String,
    },
}

#[derive(serde::Serialize)]
struct WorkerRow {
    profile_id: String,
    status: String,
    pid: u32,
    port: Option<u16>,
    updated_at_ms: u64,
}

pub async fn handle(command: WorkerCommand, service: &OrchestratorService, format: OutputFormat) -> Result<()> {
    match command {
        WorkerCommand::List => {
            let entries = service.device_registry().list()?;
            let mut rows: Vec<WorkerRow> = entries
                .iter()
                .filter_map(|e| e.as_worker())
                .map(|w| WorkerRow {
                    profile_id: w.worker_id.as_str().to_string(),
                    status: format!("{:?}", w.status).to_lowercase(),
                    pid: w.pid,
                    port: w.port,
                    updated_at_ms: w.updated_at_ms,
                })
                .collect();
            rows.sort_by(|a, b| b.updated_at_ms.cmp(&a.updated_at_ms));

            handle_list(format, &rows, "No workers found", |items, out| {
                let _ = writeln!(out, "{:<20} {:<10} {:<10} {:<8} UPDATED", "PROFILE", "STATUS", "PID", "PORT");
                for row in items {
                    let port = row.port.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
                    let _ = writeln!(
                        out,
                        "{:<20} {:<10} {:<10} {:<8} {}",
                        row.profile_id,
                        row.status,
                        row.pid,
                        port,
                        format_time_ago(row.updated_at_ms)
                    );
                }
            })?;
        }
        WorkerCommand::Stop { profile_id } => {
            let id = ProfileId::new(profile_id.as_str());
            let stopped = service.spawner().stop(&id).await;
            if stopped {
                println!("Worker '{}' stopped", color::header(&profile_id));
            } else {
                anyhow::bail!("no running worker found for profile '{profile_id}'");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_row_serializes_with_snake_case_fields() {
        let row = WorkerRow { profile_id: "alpha".into(), status: "ready".into(), pid: 42, port: Some(4100), updated_at_ms: 0 };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"profile_id\":\"alpha\""));
        assert!(json.contains("\"port\":4100"));
    }
}
