// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("worker did not signal readiness within {timeout_ms}ms")]
    SpawnTimeout { timeout_ms: u64 },

    #[error("worker process exited before signaling readiness")]
    SpawnExit,

    #[error("session creation failed: {0}")]
    SessionCreate(String),

    #[error("worker returned an empty response")]
    WorkerEmpty,

    #[error("request to worker timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
