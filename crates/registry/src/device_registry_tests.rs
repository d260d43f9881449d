// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use orch_core::WorkerEntryStatus;
use tempfile::tempdir;

fn worker(pid: u32, worker_id: &str, status: WorkerEntryStatus, updated_at_ms: u64) -> WorkerEntry {
    WorkerEntry {
        orchestrator_instance_id: Uuid::nil(),
        worker_id: ProfileId::new(worker_id),
        pid,
        url: Some("http://127.0.0.1:4001".into()),
        port: Some(4001),
        session_id: None,
        status,
        started_at_ms: 0,
        updated_at_ms,
        last_error: None,
    }
}

/// A pid guaranteed to be dead: spawn a trivial child, wait for its exit.
fn dead_pid() -> u32 {
    let mut child = std::process::Command::new("true").spawn().expect("spawn true");
    let pid = child.id();
    child.wait().expect("wait");
    pid
}

#[test]
fn upsert_then_list_round_trips_worker_entry() {
    let dir = tempdir().unwrap();
    let reg = DeviceRegistry::at_path(dir.path().join("registry.json"));
    let pid = std::process::id();
    reg.upsert_worker(worker(pid, "a", WorkerEntryStatus::Ready, 10), 10).unwrap();

    let entries = reg.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].as_worker().unwrap().worker_id, "a");
}

#[test]
fn list_filters_out_dead_pid_entries() {
    let dir = tempdir().unwrap();
    let reg = DeviceRegistry::at_path(dir.path().join("registry.json"));
    let dead = dead_pid();
    reg.upsert_worker(worker(dead, "a", WorkerEntryStatus::Ready, 10), 10).unwrap();
    reg.upsert_worker(worker(std::process::id(), "b", WorkerEntryStatus::Ready, 10), 10).unwrap();

    let entries = reg.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].as_worker().unwrap().worker_id, "b");
}

#[test]
fn upsert_replaces_same_identity_not_append() {
    let dir = tempdir().unwrap();
    let reg = DeviceRegistry::at_path(dir.path().join("registry.json"));
    let pid = std::process::id();
    reg.upsert_worker(worker(pid, "a", WorkerEntryStatus::Starting, 1), 1).unwrap();
    reg.upsert_worker(worker(pid, "a", WorkerEntryStatus::Ready, 2), 2).unwrap();

    let entries = reg.list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].as_worker().unwrap().status, WorkerEntryStatus::Ready);
}

#[test]
fn list_workers_for_orders_most_recent_first() {
    let dir = tempdir().unwrap();
    let reg = DeviceRegistry::at_path(dir.path().join("registry.json"));
    reg.upsert_worker(worker(std::process::id(), "a", WorkerEntryStatus::Ready, 5), 5).unwrap();
    reg.upsert_worker(worker(std::process::id(), "a", WorkerEntryStatus::Ready, 5), 5).unwrap();

    // Two upserts of the same identity collapse to one entry; use distinct
    // pids to exercise genuine ordering across entries for one profile.
    let dir2 = tempdir().unwrap();
    let reg2 = DeviceRegistry::at_path(dir2.path().join("registry.json"));
    let older = worker(std::process::id(), "a", WorkerEntryStatus::Ready, 5);
    let mut newer = older.clone();
    newer.orchestrator_instance_id = Uuid::new_v4();
    newer.updated_at_ms = 20;
    reg2.upsert_worker(older, 5).unwrap();
    reg2.upsert_worker(newer, 20).unwrap();

    let found = reg2.list_workers_for(&ProfileId::new("a")).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].updated_at_ms, 20);
}

#[test]
fn remove_by_pid_drops_matching_entries() {
    let dir = tempdir().unwrap();
    let reg = DeviceRegistry::at_path(dir.path().join("registry.json"));
    let pid = std::process::id();
    reg.upsert_worker(worker(pid, "a", WorkerEntryStatus::Ready, 5), 5).unwrap();
    reg.remove_by_pid(pid, 6).unwrap();

    assert!(reg.list().unwrap().is_empty());
}

#[test]
fn missing_file_reads_as_empty_document() {
    let dir = tempdir().unwrap();
    let reg = DeviceRegistry::at_path(dir.path().join("nonexistent.json"));
    assert!(reg.list().unwrap().is_empty());
}

#[test]
fn corrupt_file_degrades_to_empty_rather_than_erroring() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("registry.json");
    std::fs::write(&path, b"not json at all").unwrap();
    let reg = DeviceRegistry::at_path(path);
    assert!(reg.list().unwrap().is_empty());
}
