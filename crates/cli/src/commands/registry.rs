// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orch registry` — inspect the machine-wide device registry file
//! (spec §4.2, §6).

use anyhow::Result;
use clap::{Args, Subcommand};
use orch_daemon::OrchestratorService;

use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistryCommand,
}

#[derive(Subcommand)]
pub enum RegistryCommand {
    /// Dump every entry currently recorded in the device registry
    Show,
    /// Remove entries whose recorded pid is no longer alive
    Prune,
}

pub async fn handle(command: RegistryCommand, service: &OrchestratorService, format: OutputFormat) -> Result<()> {
    match command {
        RegistryCommand::Show => {
            let entries = service.device_registry().list()?;
            format_or_json(format, &entries, || {
                if entries.is_empty() {
                    println!("Device registry is empty");
                } else {
                    for entry in &entries {
                        match entry {
                            orch_core::DeviceRegistryEntry::Worker(w) => {
                                println!(
                                    "worker  {} pid={} status={:?} port={}",
                                    w.worker_id,
                                    w.pid,
                                    w.status,
                                    w.port.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())
                                );
                            }
                            orch_core::DeviceRegistryEntry::Session(s) => {
                                println!("session {} pid={} dir={}", s.session_id, s.host_pid, s.directory);
                            }
                        }
                    }
                }
            })?;
        }
        RegistryCommand::Prune => {
            let now_ms = service.now_ms();
            service.device_registry().prune_dead(now_ms)?;
            println!("Pruned dead entries from the device registry");
        }
    }
    Ok(())
}
