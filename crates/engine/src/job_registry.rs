// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Registry — a bounded, in-memory collection of async job records
//! (spec §4.6). Never persisted; scoped to the orchestrator process.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use orch_core::{Clock, Job, JobId, JobStatus, WorkerId};
use parking_lot::Mutex;
use tokio::sync::broadcast;

pub const MAX_JOBS: usize = 200;
pub const MAX_JOB_AGE_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone)]
pub enum JobOutcome {
    Succeeded { response_text: String },
    Failed { error: String },
}

struct State {
    jobs: HashMap<JobId, Job>,
    /// Insertion order, oldest first; kept alongside the map so age/cardinality
    /// pruning doesn't need to sort on every `create`.
    order: Vec<JobId>,
}

/// In-memory bounded store of [`Job`] records (spec §4.6 "Job Registry").
#[derive(Clone)]
pub struct JobRegistry {
    state: Arc<Mutex<State>>,
    completions: broadcast::Sender<JobId>,
    clock: Arc<dyn Clock>,
}

impl JobRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (completions, _) = broadcast::channel(256);
        Self {
            state: Arc::new(Mutex::new(State { jobs: HashMap::new(), order: Vec::new() })),
            completions,
            clock,
        }
    }

    pub fn create(&self, worker_id: WorkerId, message: String) -> JobId {
        let now = self.clock.now_ms();
        let id = JobId::new();
        let job = Job::started(id, worker_id, message, now);
        let mut state = self.state.lock();
        prune(&mut state, now);
        state.order.push(id);
        state.jobs.insert(id, job);
        id
    }

    pub fn get(&self, id: JobId) -> Option<Job> {
        self.state.lock().jobs.get(&id).cloned()
    }

    /// Most recently created jobs first, capped at `limit`.
    pub fn list(&self, limit: usize) -> Vec<Job> {
        let state = self.state.lock();
        state
            .order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| state.jobs.get(id).cloned())
            .collect()
    }

    /// Merge a structured report into the job without finalizing it (spec
    /// §4.4 "/v1/report" — report can arrive before the final text).
    pub fn attach_report(&self, id: JobId, report: serde_json::Value) -> bool {
        let mut state = self.state.lock();
        match state.jobs.get_mut(&id) {
            Some(job) => {
                job.report = Some(merge_report(job.report.take(), report));
                true
            }
            None => false,
        }
    }

    pub fn set_result(&self, id: JobId, response_text: String) -> bool {
        let now = self.clock.now_ms();
        let completed = {
            let mut state = self.state.lock();
            match state.jobs.get_mut(&id) {
                Some(job) => {
                    job.succeed(response_text, job.report.clone(), now);
                    true
                }
                None => false,
            }
        };
        if completed {
            let _ = self.completions.send(id);
        }
        completed
    }

    pub fn complete(&self, id: JobId, outcome: JobOutcome) -> bool {
        let now = self.clock.now_ms();
        let completed = {
            let mut state = self.state.lock();
            match state.jobs.get_mut(&id) {
                Some(job) => {
                    match outcome {
                        JobOutcome::Succeeded { response_text } => {
                            job.succeed(response_text, job.report.clone(), now)
                        }
                        JobOutcome::Failed { error } => job.fail(error, now),
                    }
                    true
                }
                None => false,
            }
        };
        if completed {
            let _ = self.completions.send(id);
        }
        completed
    }

    /// Resolve once the job reaches a terminal status, or fail with
    /// `JobTimeout` after `timeout` (spec §4.6 "Waiters are resolved at
    /// completion or rejected on timeout").
    pub async fn wait_for(&self, id: JobId, timeout: Duration) -> Result<Job, orch_core::OrchError> {
        if let Some(job) = self.get(id) {
            if job.status.is_terminal() {
                return Ok(job);
            }
        } else {
            return Err(orch_core::OrchError::JobNotFound(id.to_string()));
        }

        let mut rx = self.completions.subscribe();
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return Err(orch_core::OrchError::JobTimeout(id.to_string()));
            }
            match tokio::time::timeout(remaining, rx.recv()).await {
                Ok(Ok(completed_id)) => {
                    if completed_id == id {
                        if let Some(job) = self.get(id) {
                            return Ok(job);
                        }
                    }
                }
                Ok(Err(_lagged_or_closed)) => {
                    if let Some(job) = self.get(id) {
                        if job.status.is_terminal() {
                            return Ok(job);
                        }
                    }
                }
                Err(_elapsed) => return Err(orch_core::OrchError::JobTimeout(id.to_string())),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn merge_report(prior: Option<serde_json::Value>, incoming: serde_json::Value) -> serde_json::Value {
    match prior {
        Some(serde_json::Value::Object(mut base)) => {
            if let serde_json::Value::Object(incoming) = incoming {
                for (k, v) in incoming {
                    base.insert(k, v);
                }
                serde_json::Value::Object(base)
            } else {
                incoming
            }
        }
        _ => incoming,
    }
}

/// Prune by age, then enforce cardinality by removing the oldest non-running
/// jobs (spec §4.6, §8 "no running job is pruned").
fn prune(state: &mut State, now_ms: u64) {
    state.order.retain(|id| {
        let keep = match state.jobs.get(id) {
            Some(job) => {
                job.status == JobStatus::Running || now_ms.saturating_sub(job.started_at_ms) <= MAX_JOB_AGE_MS
            }
            None => false,
        };
        if !keep {
            state.jobs.remove(id);
        }
        keep
    });

    if state.order.len() <= MAX_JOBS {
        return;
    }
    let mut i = 0;
    while state.order.len() > MAX_JOBS && i < state.order.len() {
        let id = state.order[i];
        let removable = matches!(state.jobs.get(&id), Some(job) if job.status != JobStatus::Running);
        if removable {
            state.jobs.remove(&id);
            state.order.remove(i);
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
#[path = "job_registry_tests.rs"]
mod tests;
