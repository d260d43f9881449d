// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use orch_core::{FakeClock, WorkerId};
use proptest::prelude::*;

use super::*;

fn registry() -> JobRegistry {
    JobRegistry::new(Arc::new(FakeClock::default()))
}

#[test]
fn create_then_get_is_running() {
    let reg = registry();
    let id = reg.create(WorkerId::new("A"), "hi".into());
    let job = reg.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Running);
}

#[test]
fn complete_success_sets_response_and_duration() {
    let reg = registry();
    let id = reg.create(WorkerId::new("A"), "hi".into());
    assert!(reg.complete(id, JobOutcome::Succeeded { response_text: "done".into() }));
    let job = reg.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.response_text.as_deref(), Some("done"));
}

#[test]
fn attach_report_then_set_result_merges_report_into_job() {
    let reg = registry();
    let id = reg.create(WorkerId::new("A"), "hi".into());
    reg.attach_report(id, serde_json::json!({"files_changed": 3}));
    reg.set_result(id, "done".into());
    let job = reg.get(id).unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.report.unwrap()["files_changed"], 3);
}

#[test]
fn running_jobs_are_never_pruned_by_cardinality() {
    let reg = registry();
    let mut running_ids = Vec::new();
    for _ in 0..(MAX_JOBS + 50) {
        running_ids.push(reg.create(WorkerId::new("A"), "hi".into()));
    }
    assert!(reg.len() <= MAX_JOBS + 50);
    for id in running_ids {
        assert_eq!(reg.get(id).unwrap().status, JobStatus::Running);
    }
}

#[test]
fn completed_jobs_are_pruned_by_cardinality_oldest_first() {
    let reg = registry();
    let mut ids = Vec::new();
    for i in 0..(MAX_JOBS + 10) {
        let id = reg.create(WorkerId::new("A"), format!("job-{i}"));
        reg.complete(id, JobOutcome::Succeeded { response_text: "ok".into() });
        ids.push(id);
    }
    assert_eq!(reg.len(), MAX_JOBS);
    assert!(reg.get(ids[0]).is_none());
    assert!(reg.get(*ids.last().unwrap()).is_some());
}

#[tokio::test]
async fn wait_for_resolves_on_completion() {
    let reg = registry();
    let id = reg.create(WorkerId::new("A"), "hi".into());
    let waiter_reg = reg.clone();
    let waiter = tokio::spawn(async move { waiter_reg.wait_for(id, Duration::from_secs(5)).await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    reg.complete(id, JobOutcome::Succeeded { response_text: "done".into() });
    let job = waiter.await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Succeeded);
}

#[tokio::test]
async fn wait_for_times_out_on_a_job_that_never_completes() {
    let reg = registry();
    let id = reg.create(WorkerId::new("A"), "hi".into());
    let result = reg.wait_for(id, Duration::from_millis(20)).await;
    assert!(matches!(result, Err(orch_core::OrchError::JobTimeout(_))));
}

#[tokio::test]
async fn wait_for_unknown_job_fails_immediately() {
    let reg = registry();
    let result = reg.wait_for(JobId::new(), Duration::from_secs(5)).await;
    assert!(matches!(result, Err(orch_core::OrchError::JobNotFound(_))));
}

proptest! {
    #[test]
    fn job_registry_never_exceeds_max_jobs(n in 0usize..400) {
        let reg = registry();
        for i in 0..n {
            let id = reg.create(WorkerId::new("A"), format!("job-{i}"));
            reg.complete(id, JobOutcome::Succeeded { response_text: "ok".into() });
        }
        prop_assert!(reg.len() <= MAX_JOBS);
    }
}
