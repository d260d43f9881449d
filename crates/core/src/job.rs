// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job — one prompt turn dispatched to a worker (spec §3, §4.6).
//!
//! Jobs live only in the Job Registry singleton for the lifetime of the
//! orchestrator process; they are never persisted to disk.

use crate::ids::{JobId, WorkerId};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// One dispatched prompt turn and its eventual outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub worker_id: WorkerId,
    pub input: String,
    pub status: JobStatus,
    pub started_at_ms: u64,
    pub finished_at_ms: Option<u64>,
    pub duration_ms: Option<u64>,
    pub response_text: Option<String>,
    pub report: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl Job {
    /// A freshly dispatched job, still `running`.
    pub fn started(id: JobId, worker_id: WorkerId, input: String, now_ms: u64) -> Self {
        Self {
            id,
            worker_id,
            input,
            status: JobStatus::Running,
            started_at_ms: now_ms,
            finished_at_ms: None,
            duration_ms: None,
            response_text: None,
            report: None,
            error: None,
        }
    }

    pub fn succeed(&mut self, response_text: String, report: Option<serde_json::Value>, now_ms: u64) {
        self.status = JobStatus::Succeeded;
        self.finished_at_ms = Some(now_ms);
        self.duration_ms = Some(now_ms.saturating_sub(self.started_at_ms));
        self.response_text = Some(response_text);
        self.report = report;
    }

    pub fn fail(&mut self, error: String, now_ms: u64) {
        self.status = JobStatus::Failed;
        self.finished_at_ms = Some(now_ms);
        self.duration_ms = Some(now_ms.saturating_sub(self.started_at_ms));
        self.error = Some(error);
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
