// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orch workflow run` — submit a workflow definition and task to the
//! in-process workflow engine (spec §4.8).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use orch_daemon::OrchestratorService;
use orch_engine::{Attachment, Workflow, WorkflowCaps};

use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct WorkflowRunArgs {
    /// Path to a JSON file describing the workflow (id/name/description/steps)
    #[arg(long)]
    pub file: PathBuf,
    /// Task text passed into the first step's `{task}` placeholder
    #[arg(long)]
    pub task: String,
    /// Maximum number of steps this run may execute
    #[arg(long)]
    pub max_steps: Option<usize>,
}

pub async fn handle(args: WorkflowRunArgs, service: &OrchestratorService, format: OutputFormat) -> Result<()> {
    let contents = std::fs::read_to_string(&args.file)
        .with_context(|| format!("reading workflow definition {}", args.file.display()))?;
    let workflow: Workflow = serde_json::from_str(&contents)
        .with_context(|| format!("parsing workflow definition {}", args.file.display()))?;

    let mut caps = WorkflowCaps::default();
    if let Some(max_steps) = args.max_steps {
        caps.max_steps = max_steps;
    }

    let result = service
        .run_workflow(&workflow, &args.task, caps, Vec::<Attachment>::new())
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    format_or_json(format, &serializable_result(&result), || {
        println!("workflow '{}' finished ({} step(s))", workflow.name, result.steps.len());
        for step in &result.steps {
            if step.succeeded() {
                println!("  [ok]   {} ({} ms)", step.step_id, step.duration_ms);
            } else {
                println!("  [fail] {} — {}", step.step_id, step.error.as_deref().unwrap_or("unknown error"));
            }
        }
    })?;
    Ok(())
}

#[derive(serde::Serialize)]
struct StepRow {
    step_id: String,
    worker_id: String,
    succeeded: bool,
    duration_ms: u64,
    error: Option<String>,
}

#[derive(serde::Serialize)]
struct RunRow {
    workflow_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    steps: Vec<StepRow>,
}

fn serializable_result(result: &orch_engine::WorkflowRunResult) -> RunRow {
    RunRow {
        workflow_id: result.workflow_id.clone(),
        started_at_ms: result.started_at_ms,
        finished_at_ms: result.finished_at_ms,
        steps: result
            .steps
            .iter()
            .map(|s| StepRow {
                step_id: s.step_id.clone(),
                worker_id: s.worker_id.to_string(),
                succeeded: s.succeeded(),
                duration_ms: s.duration_ms,
                error: s.error.clone(),
            })
            .collect(),
    }
}
