// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device registry — the file-backed, crash-tolerant, liveness-pruned
//! inventory of worker subprocesses and host sessions on the machine
//! (spec §4.2, §6).

use std::io::Write;
use std::path::{Path, PathBuf};

use orch_core::{DeviceRegistryEntry, ProfileId, SessionEntry, WorkerEntry};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::paths;
use crate::RegistryError;

/// On-disk schema for the device registry file (spec §6 "Device registry file").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Document {
    version: u32,
    updated_at: u64,
    entries: Vec<DeviceRegistryEntry>,
}

impl Document {
    fn new(entries: Vec<DeviceRegistryEntry>, now_ms: u64) -> Self {
        Self { version: 1, updated_at: now_ms, entries }
    }
}

/// Handle onto the device registry file at a fixed path. Stateless beyond
/// the path itself — every operation reads, mutates, and atomically
/// rewrites the whole document, which is acceptable at the scale of a
/// single machine's worker fleet (spec §6 "for all device-registry
/// operations... the file is either the pre-O content or post-O content").
#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    path: PathBuf,
}

impl DeviceRegistry {
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// The device registry at its well-known location under the user's
    /// config directory (spec §4.2 "Path").
    pub fn default_location() -> Result<Self, RegistryError> {
        Ok(Self::at_path(paths::device_registry_path()?))
    }

    fn read(&self) -> Result<Document, RegistryError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes).unwrap_or_default()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, doc: &Document) -> Result<(), RegistryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        write_atomic(&self.path, &serde_json::to_vec_pretty(doc)?)?;
        Ok(())
    }

    /// All entries currently on disk, with dead-pid entries dropped
    /// (spec §9 Open Question decision: `list()`/`pruneDead()` rely solely
    /// on pid liveness).
    pub fn list(&self) -> Result<Vec<DeviceRegistryEntry>, RegistryError> {
        let doc = self.read()?;
        Ok(doc.entries.into_iter().filter(|e| pid_is_alive(e.pid())).collect())
    }

    /// Worker entries for a given profile id, most recently updated first.
    pub fn list_workers_for(&self, profile_id: &ProfileId) -> Result<Vec<WorkerEntry>, RegistryError> {
        let mut workers: Vec<WorkerEntry> = self
            .list()?
            .into_iter()
            .filter_map(|e| e.as_worker().cloned())
            .filter(|w| &w.worker_id == profile_id)
            .collect();
        workers.sort_by(|a, b| b.updated_at_ms.cmp(&a.updated_at_ms));
        Ok(workers)
    }

    /// Insert or replace the worker entry matching `(orchestrator_instance_id,
    /// worker_id, pid)` (spec §4.2 "Ordering").
    pub fn upsert_worker(&self, entry: WorkerEntry, now_ms: u64) -> Result<(), RegistryError> {
        let mut doc = self.read()?;
        let identity = entry.identity();
        doc.entries.retain(|e| e.as_worker().map(|w| w.identity()) != Some(identity));
        doc.entries.push(DeviceRegistryEntry::Worker(entry));
        doc.updated_at = now_ms;
        self.write(&doc)
    }

    pub fn upsert_session(&self, entry: SessionEntry, now_ms: u64) -> Result<(), RegistryError> {
        let mut doc = self.read()?;
        let identity = entry.identity();
        doc.entries.retain(|e| match e {
            DeviceRegistryEntry::Session(s) => s.identity() != identity,
            DeviceRegistryEntry::Worker(_) => true,
        });
        doc.entries.push(DeviceRegistryEntry::Session(entry));
        doc.updated_at = now_ms;
        self.write(&doc)
    }

    /// Remove every entry (worker or session) carrying this pid. Used both
    /// by the proactive `stop()` path and by the Spawner's reuse probe when
    /// it finds a live pid but unresponsive HTTP surface (spec §4.2
    /// "stale entry removal").
    pub fn remove_by_pid(&self, pid: u32, now_ms: u64) -> Result<(), RegistryError> {
        let mut doc = self.read()?;
        doc.entries.retain(|e| e.pid() != pid);
        doc.updated_at = now_ms;
        self.write(&doc)
    }

    /// Remove dead-pid entries and persist the result (spec §4.2
    /// "orphaned entry... removed on next prune").
    pub fn prune_dead(&self, now_ms: u64) -> Result<(), RegistryError> {
        let doc = Document::new(self.list()?, now_ms);
        self.write(&doc)
    }
}

fn pid_is_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp_path = dir.join(format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("registry"),
        Uuid::new_v4()
    ));
    {
        let mut tmp = std::fs::File::create(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "device_registry_tests.rs"]
mod tests;
