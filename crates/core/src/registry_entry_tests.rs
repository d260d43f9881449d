// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn worker_entry() -> WorkerEntry {
    WorkerEntry {
        orchestrator_instance_id: Uuid::nil(),
        worker_id: ProfileId::new("a"),
        pid: 100,
        url: Some("http://127.0.0.1:5000".into()),
        port: Some(5000),
        session_id: None,
        status: WorkerEntryStatus::Ready,
        started_at_ms: 0,
        updated_at_ms: 10,
        last_error: None,
    }
}

#[test]
fn worker_entry_serializes_with_kind_tag() {
    let entry = DeviceRegistryEntry::Worker(worker_entry());
    let json = serde_json::to_value(&entry).expect("serialize");
    assert_eq!(json["kind"], "worker");
    assert_eq!(json["workerId"].is_null(), false);
}

#[test]
fn live_and_claimed_excludes_starting_error_stopped() {
    let mut entry = worker_entry();
    assert!(entry.is_live_and_claimed());
    entry.status = WorkerEntryStatus::Starting;
    assert!(!entry.is_live_and_claimed());
    entry.status = WorkerEntryStatus::Error;
    assert!(!entry.is_live_and_claimed());
}

#[test]
fn identity_is_instance_worker_pid_tuple() {
    let entry = worker_entry();
    assert_eq!(entry.identity(), (Uuid::nil(), "a", 100));
}
