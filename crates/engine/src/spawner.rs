// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawner — produces a ready Worker Instance for a Profile with the
//! guarantee that at most one live worker subprocess exists per profile per
//! host (spec §4.1, §5).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use orch_adapters::{spawn_worker, terminate, ProviderCatalogClient, SpawnConfig, WorkerClient};
use orch_core::{
    Clock, LastResult, ModelRef, OrchError, SessionId, WorkerEntry, WorkerEntryStatus, WorkerId, WorkerInstance,
    WorkerProfile, WorkerStatus,
};
use orch_registry::{DeviceRegistry, ProfileLock};
use parking_lot::Mutex;
use tokio::process::Child;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{from_adapter_err, from_registry_err};
use crate::in_memory_registry::InMemoryRegistry;
use crate::model_resolution::{self, CatalogModel, CatalogProvider, ProviderCatalog, ProviderSource, Resolved, ResolutionHints};

/// Instructions appended to every worker's seeded system prompt telling it
/// how to call back into the bridge (spec §4.1 step 11).
const BRIDGE_INSTRUCTIONS: &str = "At the end of every turn, call the bridge's message_tool with kind \"report\". \
For inter-worker communication, call message_tool with kind \"message\".";

const DEFAULT_SPAWN_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(600);
const CURRENT_TASK_PREVIEW_CHARS: usize = 120;

/// Per-`acquire` tunables (spec §4.1 "Operation: acquire").
#[derive(Clone)]
pub struct AcquireOptions {
    pub cwd: Option<PathBuf>,
    pub spawn_timeout: Duration,
    pub lock_timeout: Duration,
    /// Needed only when the profile's model is a symbolic tag.
    pub provider_catalog_client: Option<Arc<dyn ProviderCatalogClient>>,
    pub resolution_hints: ResolutionHints,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            spawn_timeout: DEFAULT_SPAWN_TIMEOUT,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            provider_catalog_client: None,
            resolution_hints: ResolutionHints::default(),
        }
    }
}

#[derive(Clone, Default)]
pub struct SendOptions {
    pub job_id: Option<String>,
    pub deadline: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct SpawnManyResult {
    pub succeeded: Vec<WorkerInstance>,
    pub failed: Vec<(WorkerId, String)>,
}

/// In-process dedup value: `None` while the spawn is still running, `Some`
/// once the leader call has published an outcome (spec §5 "Critical section").
type SharedSpawnResult = Option<Result<WorkerInstance, String>>;

struct SpawnerInner {
    registry: InMemoryRegistry,
    device_registry: DeviceRegistry,
    profile_lock: ProfileLock,
    client: WorkerClient,
    clock: Arc<dyn Clock>,
    orchestrator_instance_id: Uuid,
    bridge_url: String,
    bridge_token: String,
    in_flight: Mutex<HashMap<WorkerId, watch::Receiver<SharedSpawnResult>>>,
    children: Mutex<HashMap<WorkerId, Child>>,
    spawn_count: AtomicUsize,
}

/// Cheaply `Clone`-able: every field lives behind one `Arc` (spec §9
/// "Module-level state" — everything but the bridge/device-registry path is
/// constructed and injected).
#[derive(Clone)]
pub struct Spawner {
    inner: Arc<SpawnerInner>,
}

impl Spawner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: InMemoryRegistry,
        device_registry: DeviceRegistry,
        profile_lock: ProfileLock,
        client: WorkerClient,
        clock: Arc<dyn Clock>,
        orchestrator_instance_id: Uuid,
        bridge_url: String,
        bridge_token: String,
    ) -> Self {
        Self {
            inner: Arc::new(SpawnerInner {
                registry,
                device_registry,
                profile_lock,
                client,
                clock,
                orchestrator_instance_id,
                bridge_url,
                bridge_token,
                in_flight: Mutex::new(HashMap::new()),
                children: Mutex::new(HashMap::new()),
                spawn_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Number of times a subprocess spawn was actually attempted (test/metrics
    /// hook for spec §8 scenario 2 "the subprocess-spawn counter").
    pub fn spawn_count(&self) -> usize {
        self.inner.spawn_count.load(Ordering::SeqCst)
    }

    pub async fn acquire(&self, profile: &WorkerProfile, options: &AcquireOptions) -> Result<WorkerInstance, OrchError> {
        let worker_id = profile.id.clone();

        // Step 1: in-memory fast path.
        if let Some(existing) = self.inner.registry.get_worker(&worker_id) {
            if existing.status.is_reusable() {
                return Ok(existing);
            }
        }

        // Step 2: in-process dedup, installed synchronously before any await.
        enum Role {
            Leader(watch::Sender<SharedSpawnResult>),
            Follower(watch::Receiver<SharedSpawnResult>),
        }

        let role = {
            let mut in_flight = self.inner.in_flight.lock();
            if let Some(rx) = in_flight.get(&worker_id) {
                Role::Follower(rx.clone())
            } else {
                let (tx, rx) = watch::channel(None);
                in_flight.insert(worker_id.clone(), rx);
                Role::Leader(tx)
            }
        };

        match role {
            Role::Follower(mut rx) => wait_for_in_flight(&mut rx, &worker_id).await,
            Role::Leader(tx) => {
                let result = self.acquire_as_leader(profile, options).await;
                let shared = result.as_ref().map(Clone::clone).map_err(ToString::to_string);
                let _ = tx.send(Some(shared));
                self.inner.in_flight.lock().remove(&worker_id);
                result
            }
        }
    }

    async fn acquire_as_leader(&self, profile: &WorkerProfile, options: &AcquireOptions) -> Result<WorkerInstance, OrchError> {
        // Step 3: pre-lock cross-process reuse attempt.
        if let Some(reused) = self.try_reuse(profile).await? {
            self.inner.registry.put(reused.clone());
            return Ok(reused);
        }

        // Step 4: acquire the profile lock; steps 5-12 run inside it.
        let clock = self.inner.clock.clone();
        let now_ms = move || clock.now_ms();
        let lock_result = self
            .inner
            .profile_lock
            .with_lock(profile.id.as_str(), options.lock_timeout, now_ms, || self.spawn_under_lock(profile, options))
            .await;

        match lock_result {
            Ok(inner_result) => inner_result,
            Err(registry_err) => Err(from_registry_err(registry_err)),
        }
    }

    async fn spawn_under_lock(&self, profile: &WorkerProfile, options: &AcquireOptions) -> Result<WorkerInstance, OrchError> {
        // Step 5: post-lock reuse re-probe — another orchestrator may have
        // spawned while we were contending for the lock.
        if let Some(reused) = self.try_reuse(profile).await? {
            self.inner.registry.put(reused.clone());
            return Ok(reused);
        }

        // Step 6: resolve model.
        let resolved_model = self.resolve_model(profile, options).await?;

        // Step 7: spawn subprocess.
        let spawn_config = self.build_spawn_config(profile, &resolved_model, options);
        self.inner.spawn_count.fetch_add(1, Ordering::SeqCst);
        let mut spawned =
            spawn_worker(spawn_config).await.map_err(|e| from_adapter_err(profile.id.as_str(), e))?;

        // Steps 9-11: preflight, session, system prompt. Failures here roll
        // back the subprocess (spec "Errors during steps 6-11").
        match self.complete_handshake(profile, &resolved_model, &spawned).await {
            Ok(instance) => {
                self.inner.children.lock().insert(profile.id.clone(), spawned.child);
                // Step 12: publish readiness.
                self.inner.registry.put(instance.clone());
                self.publish_device_entry(&instance);
                Ok(instance)
            }
            Err(err) => {
                terminate(&mut spawned.child).await;
                let now = self.inner.clock.now_ms();
                self.inner.registry.put(WorkerInstance {
                    profile: profile.clone(),
                    status: WorkerStatus::Error,
                    port: Some(spawned.port),
                    pid: Some(spawned.pid),
                    base_url: Some(spawned.base_url.clone()),
                    session_id: None,
                    started_at_ms: now,
                    last_activity_ms: now,
                    warning: None,
                    error: Some(err.to_string()),
                    current_task: None,
                    last_result: None,
                    resolution_reason: "spawn failed".to_string(),
                });
                Err(err)
            }
        }
    }

    async fn try_reuse(&self, profile: &WorkerProfile) -> Result<Option<WorkerInstance>, OrchError> {
        let entries = self.inner.device_registry.list_workers_for(&profile.id).map_err(from_registry_err)?;
        let Some(entry) = entries.into_iter().find(|e| e.is_live_and_claimed()) else {
            return Ok(None);
        };
        let Some(url) = entry.url.clone() else {
            return Ok(None);
        };

        match self.inner.client.list_sessions(&url).await {
            Ok(sessions) => {
                let session_id = entry
                    .session_id
                    .clone()
                    .filter(|sid| sessions.iter().any(|s| s.id == sid.as_str()))
                    .or_else(|| sessions.first().map(|s| SessionId::new(s.id.clone())));

                let session_id = match session_id {
                    Some(sid) => sid,
                    None => {
                        let title = format!("{} session", profile.name);
                        let created = self
                            .inner
                            .client
                            .create_session(&url, &title)
                            .await
                            .map_err(|e| from_adapter_err(profile.id.as_str(), e))?;
                        SessionId::new(created)
                    }
                };

                let now = self.inner.clock.now_ms();
                Ok(Some(WorkerInstance {
                    profile: profile.clone(),
                    status: WorkerStatus::Ready,
                    port: entry.port,
                    pid: Some(entry.pid),
                    base_url: Some(url),
                    session_id: Some(session_id),
                    started_at_ms: entry.started_at_ms,
                    last_activity_ms: now,
                    warning: None,
                    error: None,
                    current_task: None,
                    last_result: None,
                    resolution_reason: "reused existing worker".to_string(),
                }))
            }
            Err(_probe_failed) => {
                let now = self.inner.clock.now_ms();
                self.inner.device_registry.remove_by_pid(entry.pid, now).map_err(from_registry_err)?;
                Ok(None)
            }
        }
    }

    async fn resolve_model(&self, profile: &WorkerProfile, options: &AcquireOptions) -> Result<Resolved, OrchError> {
        match &profile.model {
            ModelRef::Concrete { provider, model } => {
                if provider.is_empty() || model.is_empty() {
                    return Err(OrchError::ModelInvalid(format!("malformed model reference '{provider}/{model}'")));
                }
                Ok(Resolved { provider_id: provider.clone(), model_id: model.clone() })
            }
            ModelRef::Tag(tag) => {
                let client = options
                    .provider_catalog_client
                    .as_ref()
                    .ok_or_else(|| OrchError::ModelUnresolvable { tag: tag.as_str().to_string() })?;
                let catalog =
                    client.catalog().await.map_err(|e| from_adapter_err(profile.id.as_str(), e))?;
                let resolution_catalog = to_resolution_catalog(&catalog);
                model_resolution::resolve_model_ref(tag.as_str(), &resolution_catalog, &options.resolution_hints, profile)
            }
        }
    }

    fn build_spawn_config(&self, profile: &WorkerProfile, resolved_model: &Resolved, options: &AcquireOptions) -> SpawnConfig {
        let mut env = HashMap::new();
        env.insert("OPENCODE_WORKER".to_string(), "1".to_string());
        env.insert("ORCH_BRIDGE_URL".to_string(), self.inner.bridge_url.clone());
        env.insert("ORCH_BRIDGE_TOKEN".to_string(), self.inner.bridge_token.clone());
        env.insert("ORCH_INSTANCE_ID".to_string(), self.inner.orchestrator_instance_id.to_string());
        env.insert("ORCH_WORKER_ID".to_string(), profile.id.to_string());
        env.insert("OPENCODE_CONFIG".to_string(), worker_plugin_config(profile, resolved_model, &self.inner.bridge_url));

        SpawnConfig {
            port: profile.pinned_port.unwrap_or(0),
            cwd: options.cwd.clone(),
            env,
            spawn_timeout: options.spawn_timeout,
        }
    }

    async fn complete_handshake(
        &self,
        profile: &WorkerProfile,
        resolved_model: &Resolved,
        spawned: &orch_adapters::SpawnedWorker,
    ) -> Result<WorkerInstance, OrchError> {
        // Step 9: preflight provider — warn, never fail.
        if let Ok(catalog) = self.inner.client.provider_catalog(&spawned.base_url).await {
            if let Some(provider) = catalog.providers.iter().find(|p| p.id == resolved_model.provider_id) {
                if !provider.has_credentials {
                    tracing::warn!(worker_id = %profile.id, provider = %provider.id, "provider selected without credentials");
                }
                if !provider.models.iter().any(|m| m == &resolved_model.model_id) {
                    tracing::warn!(worker_id = %profile.id, model = %resolved_model.model_id, "model not enumerated by provider catalog");
                }
            }
        }

        // Step 10: create session.
        let title = format!("{} session", profile.name);
        let session_id = self
            .inner
            .client
            .create_session(&spawned.base_url, &title)
            .await
            .map_err(|e| from_adapter_err(profile.id.as_str(), e))?;

        // Step 11: seed system instructions.
        let system_prompt = format!("{}\n\n{}", profile.system_prompt, BRIDGE_INSTRUCTIONS);
        self.inner
            .client
            .send_system_message(&spawned.base_url, &session_id, &system_prompt)
            .await
            .map_err(|e| from_adapter_err(profile.id.as_str(), e))?;

        let now = self.inner.clock.now_ms();
        Ok(WorkerInstance {
            profile: profile.clone(),
            status: WorkerStatus::Ready,
            port: Some(spawned.port),
            pid: Some(spawned.pid),
            base_url: Some(spawned.base_url.clone()),
            session_id: Some(SessionId::new(session_id)),
            started_at_ms: now,
            last_activity_ms: now,
            warning: None,
            error: None,
            current_task: None,
            last_result: None,
            resolution_reason: "spawned".to_string(),
        })
    }

    /// Send a prompt to a ready worker (spec §4.1 "Operation: send").
    pub async fn send(&self, worker_id: &WorkerId, text: &str, options: &SendOptions) -> Result<String, OrchError> {
        let mut instance =
            self.inner.registry.get_worker(worker_id).ok_or_else(|| OrchError::WorkerNotFound(worker_id.to_string()))?;
        if instance.status != WorkerStatus::Ready {
            return Err(OrchError::WorkerNotReady(worker_id.to_string()));
        }
        let base_url = instance.base_url.clone().ok_or_else(|| OrchError::WorkerNotReady(worker_id.to_string()))?;
        let session_id = instance.session_id.clone().ok_or_else(|| OrchError::WorkerNotReady(worker_id.to_string()))?;

        instance.status = WorkerStatus::Busy;
        instance.current_task = Some(preview(text));
        let started_ms = self.inner.clock.now_ms();
        self.inner.registry.put(instance.clone());

        let prompt_text = match &options.job_id {
            Some(job_id) => format!("{text}\n\n[job:{job_id}] echo this job id verbatim in your report."),
            None => text.to_string(),
        };
        let deadline = options.deadline.unwrap_or(DEFAULT_SEND_TIMEOUT);

        let outcome = self.inner.client.send_prompt(&base_url, session_id.as_str(), &prompt_text, deadline).await;

        instance.status = WorkerStatus::Ready;
        instance.current_task = None;

        match outcome {
            Ok(Some(response_text)) => {
                let finished_ms = self.inner.clock.now_ms();
                instance.last_activity_ms = finished_ms;
                instance.last_result = Some(LastResult {
                    response_text: response_text.clone(),
                    report: None,
                    duration_ms: finished_ms.saturating_sub(started_ms),
                });
                self.inner.registry.put(instance.clone());
                self.refresh_device_entry(&instance);
                Ok(response_text)
            }
            Ok(None) => {
                self.inner.registry.put(instance);
                Err(OrchError::WorkerEmpty(worker_id.to_string()))
            }
            Err(e) => {
                self.inner.registry.put(instance);
                Err(from_adapter_err(worker_id.as_str(), e))
            }
        }
    }

    /// Best-effort stop (spec §4.1 "Operation: stop").
    pub async fn stop(&self, worker_id: &WorkerId) -> bool {
        let Some(instance) = self.inner.registry.get_worker(worker_id) else {
            return false;
        };

        let child = self.inner.children.lock().remove(worker_id);
        if let Some(mut child) = child {
            terminate(&mut child).await;
        }

        self.inner.registry.unregister(worker_id);

        if let Some(pid) = instance.pid {
            let now = self.inner.clock.now_ms();
            let entry = WorkerEntry {
                orchestrator_instance_id: self.inner.orchestrator_instance_id,
                worker_id: worker_id.clone(),
                pid,
                url: instance.base_url.clone(),
                port: instance.port,
                session_id: instance.session_id.clone(),
                status: WorkerEntryStatus::Stopped,
                started_at_ms: instance.started_at_ms,
                updated_at_ms: now,
                last_error: None,
            };
            let _ = self.inner.device_registry.upsert_worker(entry, now);
            let _ = self.inner.device_registry.remove_by_pid(pid, now);
        }
        true
    }

    /// Sequential by default; parallel only when explicitly requested
    /// (spec §4.1 "Operation: spawnMany").
    pub async fn spawn_many(&self, profiles: &[WorkerProfile], options: &AcquireOptions, parallel: bool) -> SpawnManyResult {
        if !parallel {
            let mut result = SpawnManyResult::default();
            for profile in profiles {
                match self.acquire(profile, options).await {
                    Ok(instance) => result.succeeded.push(instance),
                    Err(e) => result.failed.push((profile.id.clone(), e.to_string())),
                }
            }
            return result;
        }

        let mut set = tokio::task::JoinSet::new();
        for profile in profiles.iter().cloned() {
            let spawner = self.clone();
            let options = options.clone();
            set.spawn(async move {
                let id = profile.id.clone();
                match spawner.acquire(&profile, &options).await {
                    Ok(instance) => Ok(instance),
                    Err(e) => Err((id, e.to_string())),
                }
            });
        }

        let mut result = SpawnManyResult::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(instance)) => result.succeeded.push(instance),
                Ok(Err(failure)) => result.failed.push(failure),
                Err(_join_error) => {}
            }
        }
        result
    }

    fn publish_device_entry(&self, instance: &WorkerInstance) {
        self.refresh_device_entry(instance);
    }

    fn refresh_device_entry(&self, instance: &WorkerInstance) {
        let Some(pid) = instance.pid else { return };
        let now = self.inner.clock.now_ms();
        let entry = WorkerEntry {
            orchestrator_instance_id: self.inner.orchestrator_instance_id,
            worker_id: instance.worker_id().clone(),
            pid,
            url: instance.base_url.clone(),
            port: instance.port,
            session_id: instance.session_id.clone(),
            status: to_entry_status(instance.status),
            started_at_ms: instance.started_at_ms,
            updated_at_ms: now,
            last_error: instance.error.clone(),
        };
        let _ = self.inner.device_registry.upsert_worker(entry, now);
    }
}

async fn wait_for_in_flight(
    rx: &mut watch::Receiver<SharedSpawnResult>,
    worker_id: &WorkerId,
) -> Result<WorkerInstance, OrchError> {
    loop {
        if let Some(result) = rx.borrow().clone() {
            return result.map_err(OrchError::Internal);
        }
        if rx.changed().await.is_err() {
            return Err(OrchError::Internal(format!("in-flight spawn for '{worker_id}' vanished")));
        }
    }
}

fn to_entry_status(status: WorkerStatus) -> WorkerEntryStatus {
    match status {
        WorkerStatus::Starting => WorkerEntryStatus::Starting,
        WorkerStatus::Ready => WorkerEntryStatus::Ready,
        WorkerStatus::Busy => WorkerEntryStatus::Busy,
        WorkerStatus::Error => WorkerEntryStatus::Error,
        WorkerStatus::Stopped => WorkerEntryStatus::Stopped,
    }
}

fn preview(text: &str) -> String {
    if text.len() <= CURRENT_TASK_PREVIEW_CHARS {
        text.to_string()
    } else {
        let boundary = text
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|&i| i <= CURRENT_TASK_PREVIEW_CHARS)
            .last()
            .unwrap_or(0);
        format!("{}…", &text[..boundary])
    }
}

/// The JSON document exported to the child via `OPENCODE_CONFIG` (spec §4.1
/// step 7, §6 "Worker environment").
fn worker_plugin_config(profile: &WorkerProfile, resolved_model: &Resolved, bridge_url: &str) -> String {
    let document = serde_json::json!({
        "model": resolved_model.to_string(),
        "tools": profile.tool_policy,
        "plugin": ["orchestrator-worker-bridge", bridge_url],
    });
    document.to_string()
}

/// Maps the adapters' live-catalog shape (id/models/hasCredentials) onto the
/// resolution algorithm's richer shape. Credentialed providers are treated
/// as `Config`-sourced, uncredentialed as `Api`-sourced — the live worker
/// surface does not expose a finer-grained provenance than that.
fn to_resolution_catalog(catalog: &orch_adapters::ProviderCatalog) -> ProviderCatalog {
    let providers = catalog
        .providers
        .iter()
        .map(|p| CatalogProvider {
            id: p.id.clone(),
            source: if p.has_credentials { ProviderSource::Config } else { ProviderSource::Api },
            models: p
                .models
                .iter()
                .map(|model_id| {
                    (
                        model_id.clone(),
                        CatalogModel { id: model_id.clone(), name: model_id.clone(), capabilities: Default::default() },
                    )
                })
                .collect(),
        })
        .collect();
    ProviderCatalog { providers }
}

#[cfg(test)]
#[path = "spawner_tests.rs"]
mod tests;
