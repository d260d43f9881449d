use std::sync::Arc;
use std::time::Duration;

use orch_adapters::{ProviderCatalog, ProviderCatalogClient, ProviderEntry, WorkerClient};
use orch_core::{Clock, FakeClock, ModelRef, ModelTag, WorkerInstance, WorkerProfile, WorkerStatus};
use orch_registry::{DeviceRegistry, ProfileLock};
use tempfile::TempDir;
use uuid::Uuid;

use super::*;

fn profile(id: &str, model: ModelRef) -> WorkerProfile {
    WorkerProfile {
        id: orch_core::ProfileId::new(id),
        name: id.to_string(),
        model,
        purpose: "test".to_string(),
        capabilities: Default::default(),
        tool_policy: None,
        temperature: None,
        tags: Vec::new(),
        system_prompt: "you are a test worker".to_string(),
        pinned_port: None,
    }
}

fn ready_instance(profile: &WorkerProfile, clock: &FakeClock) -> WorkerInstance {
    let now = clock.now_ms();
    WorkerInstance {
        profile: profile.clone(),
        status: WorkerStatus::Ready,
        port: Some(4100),
        pid: Some(1234),
        base_url: Some("http://127.0.0.1:4100".to_string()),
        session_id: Some(orch_core::SessionId::new("sess-1")),
        started_at_ms: now,
        last_activity_ms: now,
        warning: None,
        error: None,
        current_task: None,
        last_result: None,
        resolution_reason: "reused existing worker".to_string(),
    }
}

struct Harness {
    _dir: TempDir,
    spawner: Spawner,
    registry: InMemoryRegistry,
    clock: FakeClock,
}

fn harness() -> Harness {
    let dir = TempDir::new().expect("tempdir");
    let registry = InMemoryRegistry::new();
    let device_registry = DeviceRegistry::at_path(dir.path().join("device.json"));
    let profile_lock = ProfileLock::at_dir(dir.path().join("locks"));
    let clock = FakeClock::new(1_700_000_000_000);
    let clock_arc: Arc<dyn Clock> = Arc::new(clock.clone());

    let spawner = Spawner::new(
        registry.clone(),
        device_registry,
        profile_lock,
        WorkerClient::new(),
        clock_arc,
        Uuid::new_v4(),
        "http://127.0.0.1:4099".to_string(),
        "test-token".to_string(),
    );

    Harness { _dir: dir, spawner, registry, clock }
}

#[tokio::test]
async fn acquire_reuses_in_memory_ready_worker_without_spawning() {
    let h = harness();
    let p = profile("alpha", ModelRef::Concrete { provider: "anthropic".into(), model: "claude".into() });
    let existing = ready_instance(&p, &h.clock);
    h.registry.put(existing.clone());

    let result = h.spawner.acquire(&p, &AcquireOptions::default()).await;

    let instance = result.expect("reused instance");
    assert_eq!(instance.resolution_reason, "reused existing worker");
    assert_eq!(h.spawner.spawn_count(), 0);
}

#[tokio::test]
async fn acquire_rejects_malformed_concrete_model_before_spawning() {
    let h = harness();
    let p = profile("alpha", ModelRef::Concrete { provider: String::new(), model: String::new() });

    let err = h.spawner.acquire(&p, &AcquireOptions::default()).await.unwrap_err();

    assert_eq!(err.kind(), "MODEL_INVALID");
    assert_eq!(h.spawner.spawn_count(), 0);
}

#[tokio::test]
async fn acquire_rejects_symbolic_tag_without_catalog_client() {
    let h = harness();
    let p = profile("alpha", ModelRef::Tag(ModelTag::Auto));

    let err = h.spawner.acquire(&p, &AcquireOptions::default()).await.unwrap_err();

    assert_eq!(err.kind(), "MODEL_UNRESOLVABLE");
    assert_eq!(h.spawner.spawn_count(), 0);
}

/// A catalog client that yields before resolving, so concurrent `acquire`
/// calls have a real point to interleave at.
struct SlowCatalogClient;

#[async_trait::async_trait]
impl ProviderCatalogClient for SlowCatalogClient {
    async fn catalog(&self) -> Result<ProviderCatalog, orch_adapters::AdapterError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(ProviderCatalog {
            providers: vec![ProviderEntry { id: "fake".into(), models: vec!["fake-model".into()], has_credentials: true }],
        })
    }
}

#[tokio::test]
async fn concurrent_acquire_for_same_profile_spawns_at_most_once() {
    let h = harness();
    let p = profile("alpha", ModelRef::Tag(ModelTag::Auto));
    let mut options = AcquireOptions::default();
    options.provider_catalog_client = Some(Arc::new(SlowCatalogClient));
    options.resolution_hints = ResolutionHints { small_model: None, default_model: Some("fake-model".to_string()) };

    // `opencode` is not on PATH in this environment, so both calls ultimately
    // fail — the assertion of interest is that only one subprocess spawn was
    // ever attempted.
    let (a, b) = tokio::join!(h.spawner.acquire(&p, &options), h.spawner.acquire(&p, &options));

    assert!(a.is_err());
    assert!(b.is_err());
    assert_eq!(h.spawner.spawn_count(), 1);
}

#[tokio::test]
async fn spawn_many_sequential_partitions_success_and_failure() {
    let h = harness();
    let invalid = profile("bad", ModelRef::Concrete { provider: String::new(), model: String::new() });
    let valid = profile("good", ModelRef::Concrete { provider: "anthropic".into(), model: "claude".into() });

    let result = h.spawner.spawn_many(&[invalid, valid], &AcquireOptions::default(), false).await;

    assert!(result.succeeded.is_empty());
    assert_eq!(result.failed.len(), 2);
    // Only the profile with a syntactically valid model reference reaches
    // the point where a subprocess spawn is attempted.
    assert_eq!(h.spawner.spawn_count(), 1);
}

#[tokio::test]
async fn send_fails_for_unknown_worker() {
    let h = harness();
    let worker_id = orch_core::WorkerId::new("missing");

    let err = h.spawner.send(&worker_id, "hello", &SendOptions::default()).await.unwrap_err();

    assert_eq!(err.kind(), "WORKER_NOT_FOUND");
}

#[tokio::test]
async fn send_fails_when_worker_is_not_ready() {
    let h = harness();
    let p = profile("alpha", ModelRef::Concrete { provider: "anthropic".into(), model: "claude".into() });
    let mut instance = ready_instance(&p, &h.clock);
    instance.status = WorkerStatus::Busy;
    h.registry.put(instance);

    let err = h.spawner.send(&p.id, "hello", &SendOptions::default()).await.unwrap_err();

    assert_eq!(err.kind(), "WORKER_NOT_READY");
}

#[tokio::test]
async fn stop_is_false_for_unknown_worker_and_true_for_known_one() {
    let h = harness();
    let p = profile("alpha", ModelRef::Concrete { provider: "anthropic".into(), model: "claude".into() });

    assert!(!h.spawner.stop(&p.id).await);

    h.registry.put(ready_instance(&p, &h.clock));
    assert!(h.spawner.stop(&p.id).await);
    assert!(h.registry.get_worker(&p.id).is_none());
}
