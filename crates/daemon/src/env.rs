// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use orch_registry::paths::opencode_dir;

/// Port the Bridge HTTP server listens on. Fixed rather than OS-assigned so
/// the bridge URL handed to workers at spawn time is known before bind.
pub fn bridge_port() -> u16 {
    std::env::var("ORCH_BRIDGE_PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(4099)
}

/// Directory the daemon's own rolling log file is written under. Honors
/// `ORCH_LOG_DIR`, falling back to `<opencode dir>/logs`.
pub fn log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ORCH_LOG_DIR") {
        return PathBuf::from(dir);
    }
    opencode_dir().map(|d| d.join("logs")).unwrap_or_else(|_| PathBuf::from("."))
}

/// `EnvFilter` directive string. Honors `ORCH_LOG`, falling back to
/// `RUST_LOG`, falling back to `info`.
pub fn log_filter() -> String {
    std::env::var("ORCH_LOG").or_else(|_| std::env::var("RUST_LOG")).unwrap_or_else(|_| "info".to_string())
}

/// Path to the daemon's single-instance PID lock file.
pub fn lock_path() -> PathBuf {
    opencode_dir().map(|d| d.join("orchestrator-daemon.lock")).unwrap_or_else(|_| PathBuf::from("orchestrator-daemon.lock"))
}

/// Project directory the daemon loads project-layer configuration from, if any.
pub fn project_dir() -> Option<PathBuf> {
    std::env::var("ORCH_PROJECT_DIR").ok().map(PathBuf::from)
}
