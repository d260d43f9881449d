// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process profile lock — serializes the reuse-or-spawn region per
//! worker profile across cooperating orchestrator instances (spec §4.3).

use std::fs::OpenOptions;
use std::future::Future;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::paths;
use crate::RegistryError;

const INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const MAX_BACKOFF: Duration = Duration::from_millis(500);
/// Number of backoff rounds a lock must survive before it's considered
/// eligible for stale-breaking, even if its pid is already dead (spec §4.3
/// "after a grace period").
const STALE_GRACE_ROUNDS: u32 = 3;

#[derive(Debug, Serialize, Deserialize)]
struct LockFileBody {
    pid: u32,
    at: u64,
}

/// A held profile lock. Dropping it releases the lock file; callers should
/// prefer [`ProfileLock::with_lock`], which releases on every exit path.
pub struct ProfileLockGuard {
    path: PathBuf,
}

impl Drop for ProfileLockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[derive(Debug, Clone)]
pub struct ProfileLock {
    locks_dir: PathBuf,
}

impl ProfileLock {
    pub fn at_dir(locks_dir: PathBuf) -> Self {
        Self { locks_dir }
    }

    pub fn default_location() -> Result<Self, RegistryError> {
        Ok(Self::at_dir(paths::locks_dir()?))
    }

    fn lock_path(&self, profile_id: &str) -> PathBuf {
        self.locks_dir.join(format!("{profile_id}.lock"))
    }

    /// Run `body` with the named profile's lock held, releasing it on every
    /// exit path. Fails with [`RegistryError::LockTimeout`] if acquisition
    /// does not succeed within `timeout`.
    pub async fn with_lock<F, Fut, T>(
        &self,
        profile_id: &str,
        timeout: Duration,
        now_ms: impl Fn() -> u64,
        body: F,
    ) -> Result<T, RegistryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let guard = self.acquire(profile_id, timeout, &now_ms).await?;
        let result = body().await;
        drop(guard);
        Ok(result)
    }

    async fn acquire(
        &self,
        profile_id: &str,
        timeout: Duration,
        now_ms: &impl Fn() -> u64,
    ) -> Result<ProfileLockGuard, RegistryError> {
        std::fs::create_dir_all(&self.locks_dir)?;
        let path = self.lock_path(profile_id);
        let deadline = std::time::Instant::now() + timeout;
        let mut backoff = INITIAL_BACKOFF;
        let mut rounds = 0u32;

        loop {
            if try_create_exclusive(&path, now_ms())? {
                return Ok(ProfileLockGuard { path });
            }

            rounds += 1;
            if rounds >= STALE_GRACE_ROUNDS {
                if let Some(holder_pid) = read_lock_pid(&path) {
                    if !pid_is_alive(holder_pid) {
                        let _ = std::fs::remove_file(&path);
                        continue;
                    }
                } else {
                    // Unreadable/malformed lock file: treat as stale.
                    let _ = std::fs::remove_file(&path);
                    continue;
                }
            }

            if std::time::Instant::now() >= deadline {
                return Err(RegistryError::LockTimeout {
                    profile: profile_id.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }

            tokio::time::sleep(backoff.min(deadline.saturating_duration_since(std::time::Instant::now())))
                .await;
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }
}

/// Attempt O_EXCL-semantics creation of the lock file. Returns `Ok(true)` if
/// this call created (and now owns) the lock.
fn try_create_exclusive(path: &std::path::Path, now_ms: u64) -> Result<bool, RegistryError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            let body = LockFileBody { pid: std::process::id(), at: now_ms };
            file.write_all(&serde_json::to_vec(&body)?)?;
            file.sync_all()?;
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn read_lock_pid(path: &std::path::Path) -> Option<u32> {
    let mut contents = String::new();
    std::fs::File::open(path).ok()?.read_to_string(&mut contents).ok()?;
    let body: LockFileBody = serde_json::from_str(&contents).ok()?;
    Some(body.pid)
}

fn pid_is_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;
    kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(test)]
#[path = "profile_lock_tests.rs"]
mod tests;
