// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance daemon lock. Only one orchestrator daemon process may
//! run against a given config directory at a time.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("another orchestrator daemon instance already holds the lock at {0}")]
    AlreadyRunning(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Holds the daemon's PID lock file for the process lifetime; the lock is
/// released automatically when the file descriptor closes (process exit or
/// drop).
pub struct DaemonLock {
    file: std::fs::File,
    path: PathBuf,
}

impl DaemonLock {
    /// Acquire the lock at `path`, writing this process's pid into the file
    /// once held.
    pub fn acquire(path: PathBuf) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().write(true).create(true).truncate(false).open(&path)?;
        file.try_lock_exclusive().map_err(|_| LockError::AlreadyRunning(path.clone()))?;

        file.set_len(0)?;
        let mut file = file;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;

        Ok(Self { file, path })
    }
}

impl Drop for DaemonLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}
