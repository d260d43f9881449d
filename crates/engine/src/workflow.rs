// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow Engine — runs a named sequence of steps against workers,
//! threading a bounded "carry" of prior responses (spec §4.8).

use std::sync::Arc;
use std::time::Duration;

use orch_core::{Clock, OrchError, WorkerId};
use serde::{Deserialize, Serialize};

/// One step in a [`Workflow`] definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub id: String,
    pub title: String,
    pub worker_id: WorkerId,
    /// Prompt template containing the placeholders `{task}` and `{carry}`.
    pub template: String,
    /// Whether this step's response contributes to later steps' carry.
    #[serde(default)]
    pub carry: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<WorkflowStep>,
}

/// Per-run resource caps (spec §4.8 "Security caps"). Clamped to
/// configuration-level caps before the run begins by the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowCaps {
    pub max_steps: usize,
    pub max_task_chars: usize,
    pub max_carry_chars: usize,
    pub per_step_timeout_ms: u64,
}

impl Default for WorkflowCaps {
    fn default() -> Self {
        Self { max_steps: 20, max_task_chars: 8_000, max_carry_chars: 4_000, per_step_timeout_ms: 600_000 }
    }
}

impl WorkflowCaps {
    /// Clamp this (per-run-requested) set of caps to a configuration-level
    /// ceiling, taking the smaller of each field.
    pub fn clamp_to(self, ceiling: &WorkflowCaps) -> Self {
        Self {
            max_steps: self.max_steps.min(ceiling.max_steps),
            max_task_chars: self.max_task_chars.min(ceiling.max_task_chars),
            max_carry_chars: self.max_carry_chars.min(ceiling.max_carry_chars),
            per_step_timeout_ms: self.per_step_timeout_ms.min(ceiling.per_step_timeout_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step_id: String,
    pub worker_id: WorkerId,
    pub started_at_ms: u64,
    pub finished_at_ms: u64,
    pub duration_ms: u64,
    pub response_text: Option<String>,
    pub error: Option<String>,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowRunResult {
    pub workflow_id: String,
    pub started_at_ms: u64,
    pub finished_at_ms: u64,
    pub steps: Vec<StepOutcome>,
}

impl WorkflowRunResult {
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|s| s.succeeded())
    }
}

/// A single attachment threaded only through the workflow's first step
/// (spec §4.8 "Attachments apply only to the first step").
#[derive(Debug, Clone)]
pub struct Attachment {
    pub mime: String,
    pub data: Vec<u8>,
}

/// Dispatches one step's prompt to a worker. Implemented by the Spawner in
/// production; faked in tests so the engine is exercised without a real
/// subprocess.
#[async_trait::async_trait]
pub trait StepDispatcher: Send + Sync {
    async fn send(
        &self,
        worker_id: &WorkerId,
        text: &str,
        attachments: &[Attachment],
        deadline: Duration,
    ) -> Result<String, OrchError>;
}

pub struct WorkflowEngine {
    clock: Arc<dyn Clock>,
    dispatcher: Arc<dyn StepDispatcher>,
}

impl WorkflowEngine {
    pub fn new(clock: Arc<dyn Clock>, dispatcher: Arc<dyn StepDispatcher>) -> Self {
        Self { clock, dispatcher }
    }

    /// Run `workflow` with `task` as the initial `{task}` substitution
    /// (spec §4.8 "Execution").
    pub async fn run(
        &self,
        workflow: &Workflow,
        task: &str,
        caps: WorkflowCaps,
        attachments: Vec<Attachment>,
    ) -> Result<WorkflowRunResult, OrchError> {
        if task.len() > caps.max_task_chars {
            return Err(OrchError::WorkflowCapExceeded(format!(
                "task length {} exceeds maxTaskChars {}",
                task.len(),
                caps.max_task_chars
            )));
        }
        if workflow.steps.len() > caps.max_steps {
            return Err(OrchError::WorkflowCapExceeded(format!(
                "workflow has {} steps, exceeding maxSteps {}",
                workflow.steps.len(),
                caps.max_steps
            )));
        }

        let started_at_ms = self.clock.now_ms();
        let mut carry = String::new();
        let mut outcomes = Vec::with_capacity(workflow.steps.len());

        for (index, step) in workflow.steps.iter().enumerate() {
            let prompt = substitute(&step.template, task, &carry);
            let step_attachments: &[Attachment] = if index == 0 { &attachments } else { &[] };
            let step_started_ms = self.clock.now_ms();

            let outcome = match self
                .dispatcher
                .send(
                    &step.worker_id,
                    &prompt,
                    step_attachments,
                    Duration::from_millis(caps.per_step_timeout_ms),
                )
                .await
            {
                Ok(response_text) => {
                    let step_finished_ms = self.clock.now_ms();
                    if step.carry {
                        carry = append_carry(&carry, &step.title, &response_text, caps.max_carry_chars);
                    }
                    StepOutcome {
                        step_id: step.id.clone(),
                        worker_id: step.worker_id.clone(),
                        started_at_ms: step_started_ms,
                        finished_at_ms: step_finished_ms,
                        duration_ms: step_finished_ms.saturating_sub(step_started_ms),
                        response_text: Some(response_text),
                        error: None,
                    }
                }
                Err(e) => {
                    let step_finished_ms = self.clock.now_ms();
                    StepOutcome {
                        step_id: step.id.clone(),
                        worker_id: step.worker_id.clone(),
                        started_at_ms: step_started_ms,
                        finished_at_ms: step_finished_ms,
                        duration_ms: step_finished_ms.saturating_sub(step_started_ms),
                        response_text: None,
                        error: Some(e.to_string()),
                    }
                }
            };

            let failed = !outcome.succeeded();
            outcomes.push(outcome);
            if failed {
                break;
            }
        }

        let finished_at_ms = self.clock.now_ms();
        Ok(WorkflowRunResult { workflow_id: workflow.id.clone(), started_at_ms, finished_at_ms, steps: outcomes })
    }
}

fn substitute(template: &str, task: &str, carry: &str) -> String {
    template.replace("{task}", task).replace("{carry}", carry)
}

/// Append `"### {title}\n{response}"` to the carry, trimming from the front
/// to fit `max_carry_chars` (spec §4.8 "Execution" step 2).
fn append_carry(carry: &str, title: &str, response: &str, max_carry_chars: usize) -> String {
    let addition = format!("### {title}\n{response}");
    let mut combined = if carry.is_empty() { addition } else { format!("{carry}\n\n{addition}") };
    if combined.len() > max_carry_chars {
        let excess = combined.len() - max_carry_chars;
        let boundary = combined
            .char_indices()
            .map(|(i, _)| i)
            .find(|&i| i >= excess)
            .unwrap_or(combined.len());
        combined = combined[boundary..].to_string();
    }
    combined
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
