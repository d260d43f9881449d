// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator's normative error taxonomy (spec §7).

use thiserror::Error;

/// Every fallible orchestrator operation returns `Result<T, OrchError>`.
///
/// Variants map 1:1 onto the error kinds named in the spec so that callers
/// (CLI, bridge handlers, tool surface) can match on `.kind()` without
/// string comparison.
#[derive(Debug, Error)]
pub enum OrchError {
    #[error("config invalid: {0}")]
    ConfigInvalid(String),

    #[error("model reference invalid: {0}")]
    ModelInvalid(String),

    #[error("model tag '{tag}' could not be resolved against the current provider catalog")]
    ModelUnresolvable { tag: String },

    #[error("profile '{profile}' requires vision but resolved model '{model}' lacks it")]
    VisionRequired { profile: String, model: String },

    #[error("profile lock for '{profile}' not acquired within {timeout_ms}ms")]
    LockTimeout { profile: String, timeout_ms: u64 },

    #[error("worker '{worker}' did not signal readiness within {timeout_ms}ms")]
    SpawnTimeout { worker: String, timeout_ms: u64 },

    #[error("worker '{worker}' process exited before signaling readiness")]
    SpawnExit { worker: String },

    #[error("session creation failed for worker '{worker}': {message}")]
    SessionCreate { worker: String, message: String },

    #[error("worker '{0}' not found")]
    WorkerNotFound(String),

    #[error("worker '{0}' is not ready")]
    WorkerNotReady(String),

    #[error("worker '{0}' returned an empty response")]
    WorkerEmpty(String),

    #[error("job '{0}' not found")]
    JobNotFound(String),

    #[error("job '{0}' timed out waiting for completion")]
    JobTimeout(String),

    #[error("bridge request unauthorized")]
    BridgeUnauthorized,

    #[error("bridge request malformed: {0}")]
    BridgeBadRequest(String),

    #[error("bridge route not found: {0}")]
    BridgeNotFound(String),

    #[error("workflow '{0}' is not defined")]
    WorkflowUnknown(String),

    #[error("workflow exceeded its resource cap: {0}")]
    WorkflowCapExceeded(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    /// A concurrent caller observes this when it joins an in-flight spawn
    /// that the leader call failed; carries the leader's error message
    /// since `OrchError` itself is not `Clone` (spec §5 "in-process dedup").
    #[error("{0}")]
    Internal(String),
}

impl OrchError {
    /// Stable, machine-readable kind string (used in bridge error bodies and
    /// anywhere a caller needs to branch without matching the Display text).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigInvalid(_) => "CONFIG_INVALID",
            Self::ModelInvalid(_) => "MODEL_INVALID",
            Self::ModelUnresolvable { .. } => "MODEL_UNRESOLVABLE",
            Self::VisionRequired { .. } => "VISION_REQUIRED",
            Self::LockTimeout { .. } => "LOCK_TIMEOUT",
            Self::SpawnTimeout { .. } => "SPAWN_TIMEOUT",
            Self::SpawnExit { .. } => "SPAWN_EXIT",
            Self::SessionCreate { .. } => "SESSION_CREATE",
            Self::WorkerNotFound(_) => "WORKER_NOT_FOUND",
            Self::WorkerNotReady(_) => "WORKER_NOT_READY",
            Self::WorkerEmpty(_) => "WORKER_EMPTY",
            Self::JobNotFound(_) => "JOB_NOT_FOUND",
            Self::JobTimeout(_) => "JOB_TIMEOUT",
            Self::BridgeUnauthorized => "BRIDGE_UNAUTHORIZED",
            Self::BridgeBadRequest(_) => "BRIDGE_BAD_REQUEST",
            Self::BridgeNotFound(_) => "BRIDGE_NOT_FOUND",
            Self::WorkflowUnknown(_) => "WORKFLOW_UNKNOWN",
            Self::WorkflowCapExceeded(_) => "WORKFLOW_CAP_EXCEEDED",
            Self::Io(_) => "IO",
            Self::Serde(_) => "SERDE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
