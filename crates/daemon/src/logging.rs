// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured logging setup: an `EnvFilter`-driven subscriber writing to a
//! daily-rolling file under the daemon's log directory, plus stderr.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber. The returned guard must be
/// held for the process lifetime — dropping it stops the background
/// flush thread for the file appender.
pub fn init() -> std::io::Result<WorkerGuard> {
    let log_dir = crate::env::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "orchestrator.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_new(crate::env::log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.and(std::io::stderr))
        .with_target(true)
        .init();

    Ok(guard)
}
