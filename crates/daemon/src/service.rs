// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the orchestrator's stateful components together into one handle
//! shared by the Bridge HTTP server and (in-process) the CLI.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use orch_core::{Clock, OrchError, SystemClock, WorkerId};
use orch_engine::{
    from_adapter_err, from_registry_err, load_config, AcquireOptions, Config, InMemoryRegistry, JobOutcome,
    JobRegistry, MessageBus, SendOptions, Spawner, StepDispatcher, Attachment, Workflow, WorkflowCaps, WorkflowEngine,
    WorkflowRunResult,
};
use orch_registry::{DeviceRegistry, ProfileLock};
use orch_wire::{
    InboxEntry, InboxQuery, InboxResponse, MessageRequest, MessageResponse, ReportRequest, ReportResponse,
};
use uuid::Uuid;

struct SpawnerDispatcher(Spawner);

#[async_trait::async_trait]
impl StepDispatcher for SpawnerDispatcher {
    async fn send(
        &self,
        worker_id: &WorkerId,
        text: &str,
        _attachments: &[Attachment],
        deadline: Duration,
    ) -> Result<String, OrchError> {
        self.0.send(worker_id, text, &SendOptions { job_id: None, deadline: Some(deadline) }).await
    }
}

/// The orchestrator process's full set of live components. Constructed once
/// at daemon startup and shared (behind an `Arc`) with the Bridge router.
pub struct OrchestratorService {
    config: Config,
    orchestrator_instance_id: Uuid,
    bridge_token: String,
    clock: Arc<dyn Clock>,
    registry: InMemoryRegistry,
    device_registry: DeviceRegistry,
    job_registry: JobRegistry,
    message_bus: MessageBus,
    spawner: Spawner,
    workflow_engine: WorkflowEngine,
}

impl OrchestratorService {
    pub fn new(project_dir: Option<PathBuf>) -> Result<Self, OrchError> {
        let config = load_config(project_dir.as_deref());

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let registry = InMemoryRegistry::new();
        let device_registry = DeviceRegistry::default_location().map_err(from_registry_err)?;
        let profile_lock = ProfileLock::default_location().map_err(from_registry_err)?;
        let job_registry = JobRegistry::new(clock.clone());
        let message_bus = MessageBus::new(clock.clone());

        let orchestrator_instance_id = Uuid::new_v4();
        let bridge_token = Uuid::new_v4().to_string();
        let bridge_url = format!("http://127.0.0.1:{}", crate::env::bridge_port());

        let client = orch_adapters::WorkerClient::new();
        let spawner = Spawner::new(
            registry.clone(),
            device_registry.clone(),
            profile_lock,
            client,
            clock.clone(),
            orchestrator_instance_id,
            bridge_url,
            bridge_token.clone(),
        );

        let workflow_engine = WorkflowEngine::new(clock.clone(), Arc::new(SpawnerDispatcher(spawner.clone())));

        Ok(Self {
            config,
            orchestrator_instance_id,
            bridge_token,
            clock,
            registry,
            device_registry,
            job_registry,
            message_bus,
            spawner,
            workflow_engine,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orchestrator_instance_id(&self) -> Uuid {
        self.orchestrator_instance_id
    }

    pub fn bridge_token(&self) -> &str {
        &self.bridge_token
    }

    pub fn registry(&self) -> &InMemoryRegistry {
        &self.registry
    }

    pub fn device_registry(&self) -> &DeviceRegistry {
        &self.device_registry
    }

    pub fn job_registry(&self) -> &JobRegistry {
        &self.job_registry
    }

    pub fn message_bus(&self) -> &MessageBus {
        &self.message_bus
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub async fn acquire(&self, profile: &orch_core::WorkerProfile, options: &AcquireOptions) -> Result<orch_core::WorkerInstance, OrchError> {
        self.spawner.acquire(profile, options).await
    }

    pub async fn run_workflow(
        &self,
        workflow: &Workflow,
        task: &str,
        caps: WorkflowCaps,
        attachments: Vec<Attachment>,
    ) -> Result<WorkflowRunResult, OrchError> {
        self.workflow_engine.run(workflow, task, caps, attachments).await
    }

    /// Handle a worker's `POST /v1/report` (spec §4.4). Correlates the
    /// report to a job via the echoed `jobId` sentinel, if present.
    pub fn handle_report(&self, req: ReportRequest) -> ReportResponse {
        if let Some(job_id_str) = req.job_id.as_deref() {
            if let Ok(uuid) = Uuid::parse_str(job_id_str) {
                let job_id = orch_core::JobId(uuid);
                if let Some(report) = req.report {
                    self.job_registry.attach_report(job_id, report);
                }
                if let Some(final_text) = req.final_text {
                    self.job_registry.complete(job_id, JobOutcome::Succeeded { response_text: final_text });
                }
            }
        }
        ReportResponse::ok()
    }

    /// Handle `POST /v1/message` (spec §4.4, §4.6).
    pub fn handle_message(&self, req: MessageRequest) -> MessageResponse {
        let message = self.message_bus.send(req.from, req.to, req.topic, req.text);
        MessageResponse { ok: true, id: message.id.to_string(), created_at_ms: message.created_at_ms }
    }

    /// Handle `GET /v1/inbox` (spec §4.4, §4.6).
    pub fn handle_inbox(&self, query: InboxQuery) -> InboxResponse {
        let after = query.after.unwrap_or(0);
        let messages = self
            .message_bus
            .list(&query.to, after, query.limit as usize)
            .into_iter()
            .map(|m| InboxEntry {
                id: m.id.to_string(),
                from: m.from,
                to: m.to,
                topic: m.topic,
                text: m.text,
                created_at_ms: m.created_at_ms,
            })
            .collect();
        InboxResponse { messages }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Mark a job failed when a worker reports an adapter-level error
    /// before it can post its own report (used by the CLI's `send` path).
    pub fn fail_job(&self, job_id: orch_core::JobId, error: impl Into<String>) {
        self.job_registry.complete(job_id, JobOutcome::Failed { error: error.into() });
    }

    pub fn map_adapter_err(&self, worker: &str, e: orch_adapters::AdapterError) -> OrchError {
        from_adapter_err(worker, e)
    }
}
