// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orch_core::{ModelRef, ProfileId, SessionId, WorkerProfile};

fn profile(id: &str) -> WorkerProfile {
    WorkerProfile {
        id: ProfileId::new(id),
        name: id.to_string(),
        model: ModelRef::Concrete { provider: "p".into(), model: "m".into() },
        purpose: "test".into(),
        capabilities: Default::default(),
        tool_policy: None,
        temperature: None,
        tags: vec![],
        system_prompt: String::new(),
        pinned_port: None,
    }
}

fn instance(id: &str, status: WorkerStatus) -> WorkerInstance {
    WorkerInstance {
        profile: profile(id),
        status,
        port: None,
        pid: None,
        base_url: None,
        session_id: None,
        started_at_ms: 0,
        last_activity_ms: 0,
        warning: None,
        error: None,
        current_task: None,
        last_result: None,
        resolution_reason: "spawned".into(),
    }
}

#[test]
fn register_then_get_roundtrips() {
    let registry = InMemoryRegistry::new();
    registry.register(instance("A", WorkerStatus::Ready));
    let got = registry.get_worker(&ProfileId::new("A")).unwrap();
    assert_eq!(got.status, WorkerStatus::Ready);
}

#[test]
fn unregister_removes_and_clears_ownership() {
    let registry = InMemoryRegistry::new();
    registry.register(instance("A", WorkerStatus::Ready));
    let session = SessionId::new("S1");
    registry.track_ownership(&session, &ProfileId::new("A"));
    assert!(registry.unregister(&ProfileId::new("A")).is_some());
    assert!(registry.get_worker(&ProfileId::new("A")).is_none());
    assert!(registry.get_workers_for_session(&session).is_empty());
}

#[test]
fn get_active_workers_excludes_error_and_stopped() {
    let registry = InMemoryRegistry::new();
    registry.register(instance("A", WorkerStatus::Ready));
    registry.register(instance("B", WorkerStatus::Error));
    registry.register(instance("C", WorkerStatus::Stopped));
    let mut active: Vec<String> = registry.get_active_workers().iter().map(|w| w.worker_id().to_string()).collect();
    active.sort();
    assert_eq!(active, vec!["A".to_string()]);
}

#[test]
fn update_status_clears_error_when_leaving_error_state() {
    let registry = InMemoryRegistry::new();
    registry.register(instance("A", WorkerStatus::Error));
    registry.update_status(&ProfileId::new("A"), WorkerStatus::Error, Some("boom".into()));
    assert_eq!(registry.get_worker(&ProfileId::new("A")).unwrap().error.as_deref(), Some("boom"));
    registry.update_status(&ProfileId::new("A"), WorkerStatus::Ready, None);
    assert!(registry.get_worker(&ProfileId::new("A")).unwrap().error.is_none());
}

#[test]
fn track_ownership_is_first_session_wins() {
    let registry = InMemoryRegistry::new();
    registry.register(instance("A", WorkerStatus::Ready));
    let s1 = SessionId::new("S1");
    let s2 = SessionId::new("S2");
    registry.track_ownership(&s1, &ProfileId::new("A"));
    registry.track_ownership(&s2, &ProfileId::new("A"));
    assert_eq!(registry.get_workers_for_session(&s1), vec![ProfileId::new("A")]);
    assert!(registry.get_workers_for_session(&s2).is_empty());
}

#[test]
fn clear_session_ownership_does_not_touch_other_sessions() {
    let registry = InMemoryRegistry::new();
    registry.register(instance("A", WorkerStatus::Ready));
    registry.register(instance("B", WorkerStatus::Ready));
    let s1 = SessionId::new("S1");
    let s2 = SessionId::new("S2");
    registry.track_ownership(&s1, &ProfileId::new("A"));
    registry.track_ownership(&s2, &ProfileId::new("B"));
    registry.clear_session_ownership(&s1);
    assert!(registry.get_workers_for_session(&s1).is_empty());
    assert_eq!(registry.get_workers_for_session(&s2), vec![ProfileId::new("B")]);
}

#[test]
fn get_summary_reports_totals_and_truncates() {
    let registry = InMemoryRegistry::new();
    registry.register(instance("A", WorkerStatus::Ready));
    registry.register(instance("B", WorkerStatus::Error));
    let summary = registry.get_summary(1);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.active, 1);
    assert_eq!(summary.workers.len(), 1);
}

#[test]
fn events_are_emitted_in_commit_order() {
    let registry = InMemoryRegistry::new();
    let mut rx = registry.subscribe();
    registry.register(instance("A", WorkerStatus::Starting));
    registry.update_status(&ProfileId::new("A"), WorkerStatus::Ready, None);
    registry.unregister(&ProfileId::new("A"));

    let first = rx.try_recv().unwrap();
    let second = rx.try_recv().unwrap();
    let third = rx.try_recv().unwrap();
    assert!(matches!(first, RegistryEvent::Registered(_)));
    assert!(matches!(second, RegistryEvent::Updated(_)));
    assert!(matches!(third, RegistryEvent::Unregistered(_)));
}
