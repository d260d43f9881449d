// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::profile::{Capabilities, ModelRef, ModelTag};

fn profile() -> WorkerProfile {
    WorkerProfile {
        id: ProfileId::new("a"),
        name: "A".into(),
        model: ModelRef::Tag(ModelTag::Auto),
        purpose: "testing".into(),
        capabilities: Capabilities::default(),
        tool_policy: None,
        temperature: None,
        tags: vec![],
        system_prompt: String::new(),
        pinned_port: None,
    }
}

fn instance(status: WorkerStatus) -> WorkerInstance {
    WorkerInstance {
        profile: profile(),
        status,
        port: Some(4000),
        pid: Some(123),
        base_url: Some("http://127.0.0.1:4000".into()),
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
fn reusable_excludes_error_and_stopped() {
    assert!(instance(WorkerStatus::Starting).status.is_reusable());
    assert!(instance(WorkerStatus::Ready).status.is_reusable());
    assert!(instance(WorkerStatus::Busy).status.is_reusable());
    assert!(!instance(WorkerStatus::Error).status.is_reusable());
    assert!(!instance(WorkerStatus::Stopped).status.is_reusable());
}

#[test]
fn worker_id_matches_profile_id() {
    let inst = instance(WorkerStatus::Ready);
    assert_eq!(inst.worker_id().as_str(), "a");
}

#[test]
fn status_displays_lowercase() {
    assert_eq!(WorkerStatus::Ready.to_string(), "ready");
    assert_eq!(WorkerStatus::Error.to_string(), "error");
}
