// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device registry entry types (spec §3, §4.2).

use crate::ids::{ProfileId, SessionId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status recorded for a worker entry in the device registry. A strict
/// subset of [`crate::worker::WorkerStatus`] — device-registry entries never
/// persist the `starting` transient, only what's externally observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerEntryStatus {
    Starting,
    Ready,
    Busy,
    Error,
    Stopped,
}

/// A worker subprocess entry in the machine-wide device registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerEntry {
    pub orchestrator_instance_id: Uuid,
    pub worker_id: ProfileId,
    pub pid: u32,
    pub url: Option<String>,
    pub port: Option<u16>,
    pub session_id: Option<SessionId>,
    pub status: WorkerEntryStatus,
    pub started_at_ms: u64,
    pub updated_at_ms: u64,
    pub last_error: Option<String>,
}

impl WorkerEntry {
    /// Entry identity for upsert/dedup purposes (spec §4.2 "Ordering").
    pub fn identity(&self) -> (Uuid, &str, u32) {
        (self.orchestrator_instance_id, self.worker_id.as_str(), self.pid)
    }

    pub fn is_live_and_claimed(&self) -> bool {
        matches!(self.status, WorkerEntryStatus::Ready | WorkerEntryStatus::Busy)
    }
}

/// A host-assistant session entry in the device registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEntry {
    pub host_pid: u32,
    pub session_id: SessionId,
    pub directory: String,
    pub title: String,
    pub started_at_ms: u64,
    pub updated_at_ms: u64,
}

impl SessionEntry {
    pub fn identity(&self) -> (u32, &str) {
        (self.host_pid, self.session_id.as_str())
    }
}

/// A single entry in the device registry document. Tagged by `kind` on the
/// wire (spec §6 "Device registry file").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeviceRegistryEntry {
    Worker(WorkerEntry),
    Session(SessionEntry),
}

impl DeviceRegistryEntry {
    pub fn updated_at_ms(&self) -> u64 {
        match self {
            Self::Worker(w) => w.updated_at_ms,
            Self::Session(s) => s.updated_at_ms,
        }
    }

    pub fn pid(&self) -> u32 {
        match self {
            Self::Worker(w) => w.pid,
            Self::Session(s) => s.host_pid,
        }
    }

    pub fn as_worker(&self) -> Option<&WorkerEntry> {
        match self {
            Self::Worker(w) => Some(w),
            Self::Session(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "registry_entry_tests.rs"]
mod tests;
