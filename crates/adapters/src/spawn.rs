// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker subprocess lifecycle: launch `opencode serve`, scan its
//! stdout+stderr for the readiness line, and tear it down on demand
//! (spec §4.1 steps 7-8, §4.1 "Errors during steps 6-11").

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::error::AdapterError;

/// Everything needed to launch one worker subprocess.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// `0` lets the OS assign a port; `Some(p)` pins it (spec §4.1 step 7).
    pub port: u16,
    pub cwd: Option<PathBuf>,
    pub env: HashMap<String, String>,
    pub spawn_timeout: Duration,
}

/// A live worker subprocess past the readiness gate.
pub struct SpawnedWorker {
    pub child: Child,
    pub pid: u32,
    pub base_url: String,
    pub port: u16,
}

const READINESS_PREFIX: &str = "opencode server listening";

/// Launch `opencode serve --hostname=127.0.0.1 --port=<p>` and block until
/// it prints its readiness line, exits, or the deadline elapses.
pub async fn spawn_worker(config: SpawnConfig) -> Result<SpawnedWorker, AdapterError> {
    let mut command = Command::new("opencode");
    command
        .arg("serve")
        .arg("--hostname=127.0.0.1")
        .arg(format!("--port={}", config.port))
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    if let Some(cwd) = &config.cwd {
        command.current_dir(cwd);
    }
    for (key, value) in &config.env {
        command.env(key, value);
    }

    let mut child = command.spawn()?;
    let pid = child.id().unwrap_or(0);

    let stdout = child.stdout.take().ok_or_else(|| {
        std::io::Error::other("spawned child has no stdout pipe")
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        std::io::Error::other("spawned child has no stderr pipe")
    })?;

    let (tx, mut rx) = mpsc::channel::<String>(64);
    tokio::spawn(forward_lines(stdout, tx.clone()));
    tokio::spawn(forward_lines(stderr, tx));

    let readiness = async {
        while let Some(line) = rx.recv().await {
            if let Some(url) = parse_readiness_line(&line) {
                return Some(url);
            }
        }
        None
    };

    tokio::select! {
        result = tokio::time::timeout(config.spawn_timeout, readiness) => {
            match result {
                Ok(Some(base_url)) => {
                    let port = parse_port(&base_url).unwrap_or(config.port);
                    Ok(SpawnedWorker { child, pid, base_url, port })
                }
                Ok(None) => {
                    terminate(&mut child).await;
                    Err(AdapterError::SpawnExit)
                }
                Err(_) => {
                    terminate(&mut child).await;
                    Err(AdapterError::SpawnTimeout { timeout_ms: config.spawn_timeout.as_millis() as u64 })
                }
            }
        }
        status = child.wait() => {
            tracing::warn!(pid, ?status, "worker process exited before signaling readiness");
            Err(AdapterError::SpawnExit)
        }
    }
}

async fn forward_lines(stream: impl tokio::io::AsyncRead + Unpin, tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
            break;
        }
    }
}

fn parse_readiness_line(line: &str) -> Option<String> {
    if !line.trim_start().starts_with(READINESS_PREFIX) {
        return None;
    }
    line.split_whitespace()
        .find(|tok| tok.starts_with("http://") || tok.starts_with("https://"))
        .map(|s| s.trim_end_matches(['.', ',']).to_string())
}

fn parse_port(base_url: &str) -> Option<u16> {
    base_url.rsplit_once(':').and_then(|(_, port)| port.trim_end_matches('/').parse().ok())
}

/// SIGTERM, then SIGKILL after a 2s grace period (spec "Errors during steps
/// 6-11 roll back the subprocess").
pub async fn terminate(child: &mut Child) {
    if let Some(pid) = child.id() {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    }

    if tokio::time::timeout(Duration::from_secs(2), child.wait()).await.is_err() {
        let _ = child.start_kill();
        let _ = child.wait().await;
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
