// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn started_job_is_running_with_no_outcome() {
    let job = Job::started(JobId::new(), WorkerId::new("a"), "do a thing".into(), 100);
    assert_eq!(job.status, JobStatus::Running);
    assert!(!job.status.is_terminal());
    assert!(job.finished_at_ms.is_none());
    assert!(job.duration_ms.is_none());
}

#[test]
fn succeed_records_duration_and_response() {
    let mut job = Job::started(JobId::new(), WorkerId::new("a"), "do a thing".into(), 100);
    job.succeed("done".into(), Some(serde_json::json!({"ok": true})), 150);
    assert_eq!(job.status, JobStatus::Succeeded);
    assert!(job.status.is_terminal());
    assert_eq!(job.finished_at_ms, Some(150));
    assert_eq!(job.duration_ms, Some(50));
    assert_eq!(job.response_text.as_deref(), Some("done"));
    assert!(job.error.is_none());
}

#[test]
fn fail_records_duration_and_error() {
    let mut job = Job::started(JobId::new(), WorkerId::new("a"), "do a thing".into(), 100);
    job.fail("timed out".into(), 400);
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.duration_ms, Some(300));
    assert_eq!(job.error.as_deref(), Some("timed out"));
    assert!(job.response_text.is_none());
}

#[test]
fn job_serializes_with_camel_case_fields() {
    let job = Job::started(JobId::new(), WorkerId::new("a"), "x".into(), 0);
    let json = serde_json::to_value(&job).expect("serialize");
    assert!(json.get("workerId").is_some());
    assert!(json.get("startedAtMs").is_some());
}
