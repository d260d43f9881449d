// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory registry — the per-process catalog of known Worker Instances
//! and the session-ownership map (spec §4.5).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use orch_core::{SessionId, WorkerId, WorkerInstance, WorkerStatus};
use parking_lot::RwLock;
use tokio::sync::broadcast;

/// Registry events, emitted in commit order (spec §5 "Ordering guarantees").
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    Registered(WorkerId),
    Updated(WorkerId),
    Unregistered(WorkerId),
}

/// A bounded summary of the fleet, as returned by `getSummary`.
#[derive(Debug, Clone)]
pub struct RegistrySummary {
    pub total: usize,
    pub active: usize,
    pub workers: Vec<WorkerInstance>,
}

#[derive(Default)]
struct State {
    workers: HashMap<WorkerId, WorkerInstance>,
    /// `sessionId -> set<workerId>`, first-session-wins (spec §4.5 "Ownership map").
    ownership: HashMap<SessionId, HashSet<WorkerId>>,
    owned_by: HashMap<WorkerId, SessionId>,
}

/// Thread-safe catalog of currently known Worker Instances for this
/// orchestrator process. Cheap to clone: all state lives behind an `Arc`.
#[derive(Clone)]
pub struct InMemoryRegistry {
    state: Arc<RwLock<State>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self { state: Arc::new(RwLock::new(State::default())), events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: RegistryEvent) {
        let _ = self.events.send(event);
    }

    pub fn register(&self, instance: WorkerInstance) {
        let id = instance.worker_id().clone();
        self.state.write().workers.insert(id.clone(), instance);
        self.emit(RegistryEvent::Registered(id));
    }

    pub fn unregister(&self, worker_id: &WorkerId) -> Option<WorkerInstance> {
        let removed = {
            let mut state = self.state.write();
            let removed = state.workers.remove(worker_id);
            if removed.is_some() {
                if let Some(owner) = state.owned_by.remove(worker_id) {
                    if let Some(set) = state.ownership.get_mut(&owner) {
                        set.remove(worker_id);
                    }
                }
            }
            removed
        };
        if removed.is_some() {
            self.emit(RegistryEvent::Unregistered(worker_id.clone()));
        }
        removed
    }

    pub fn update_status(&self, worker_id: &WorkerId, status: WorkerStatus, error: Option<String>) -> bool {
        let updated = {
            let mut state = self.state.write();
            match state.workers.get_mut(worker_id) {
                Some(w) => {
                    w.status = status;
                    if error.is_some() {
                        w.error = error;
                    } else if status != WorkerStatus::Error {
                        w.error = None;
                    }
                    true
                }
                None => false,
            }
        };
        if updated {
            self.emit(RegistryEvent::Updated(worker_id.clone()));
        }
        updated
    }

    /// Replace a worker's full instance record (used after `send`/status
    /// round trips where more than the status field changes).
    pub fn put(&self, instance: WorkerInstance) {
        let id = instance.worker_id().clone();
        let existed = {
            let mut state = self.state.write();
            let existed = state.workers.contains_key(&id);
            state.workers.insert(id.clone(), instance);
            existed
        };
        self.emit(if existed { RegistryEvent::Updated(id) } else { RegistryEvent::Registered(id) });
    }

    pub fn get_worker(&self, worker_id: &WorkerId) -> Option<WorkerInstance> {
        self.state.read().workers.get(worker_id).cloned()
    }

    pub fn get_active_workers(&self) -> Vec<WorkerInstance> {
        self.state
            .read()
            .workers
            .values()
            .filter(|w| w.status.is_reusable())
            .cloned()
            .collect()
    }

    /// Workers whose profile tags (or capability flags) contain `capability`.
    pub fn get_workers_by_capability(&self, capability: &str) -> Vec<WorkerInstance> {
        self.state
            .read()
            .workers
            .values()
            .filter(|w| {
                w.profile.tags.iter().any(|t| t == capability)
                    || (capability == "vision" && w.profile.requires_vision())
            })
            .cloned()
            .collect()
    }

    /// Record that `session_id` owns `worker_id`, unless some other session
    /// already claimed it first (spec §4.5 "tracked only for the first
    /// session that acquires it").
    pub fn track_ownership(&self, session_id: &SessionId, worker_id: &WorkerId) {
        let mut state = self.state.write();
        if state.owned_by.contains_key(worker_id) {
            return;
        }
        state.owned_by.insert(worker_id.clone(), session_id.clone());
        state.ownership.entry(session_id.clone()).or_default().insert(worker_id.clone());
    }

    pub fn get_workers_for_session(&self, session_id: &SessionId) -> Vec<WorkerId> {
        self.state
            .read()
            .ownership
            .get(session_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop the ownership record for a disposed session, without touching
    /// the workers themselves (the caller stops them separately).
    pub fn clear_session_ownership(&self, session_id: &SessionId) {
        let mut state = self.state.write();
        if let Some(owned) = state.ownership.remove(session_id) {
            for worker_id in owned {
                state.owned_by.remove(&worker_id);
            }
        }
    }

    pub fn get_summary(&self, max_workers: usize) -> RegistrySummary {
        let state = self.state.read();
        let total = state.workers.len();
        let active = state.workers.values().filter(|w| w.status.is_reusable()).count();
        let mut workers: Vec<WorkerInstance> = state.workers.values().cloned().collect();
        workers.sort_by(|a, b| a.worker_id().as_str().cmp(b.worker_id().as_str()));
        workers.truncate(max_workers);
        RegistrySummary { total, active, workers }
    }
}

#[cfg(test)]
#[path = "in_memory_registry_tests.rs"]
mod tests;
