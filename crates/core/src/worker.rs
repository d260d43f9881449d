// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker instance — runtime state for an active worker (spec §3).

use crate::ids::{ProfileId, SessionId};
use crate::profile::WorkerProfile;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Starting,
    Ready,
    Busy,
    Error,
    Stopped,
}

impl WorkerStatus {
    /// Whether an in-memory-registry entry in this status is eligible for
    /// the Spawner's in-memory fast path (spec §4.1 step 1).
    pub fn is_reusable(&self) -> bool {
        !matches!(self, Self::Error | Self::Stopped)
    }
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Busy => "busy",
            Self::Error => "error",
            Self::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

/// One completed turn's outcome, cached on the instance (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastResult {
    pub response_text: String,
    pub report: Option<serde_json::Value>,
    pub duration_ms: u64,
}

/// Runtime state for an active worker subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInstance {
    pub profile: WorkerProfile,
    pub status: WorkerStatus,
    pub port: Option<u16>,
    pub pid: Option<u32>,
    pub base_url: Option<String>,
    pub session_id: Option<SessionId>,
    pub started_at_ms: u64,
    pub last_activity_ms: u64,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub current_task: Option<String>,
    pub last_result: Option<LastResult>,
    /// Human-readable note on how this instance came to exist, e.g.
    /// "reused existing worker" (spec §4.1 step 3) or "spawned".
    pub resolution_reason: String,
}

impl WorkerInstance {
    pub fn worker_id(&self) -> &ProfileId {
        &self.profile.id
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
