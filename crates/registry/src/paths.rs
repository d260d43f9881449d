// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known filesystem locations under the user's config directory
//! (spec §4.2, §4.3, §6).

use std::path::PathBuf;

use crate::RegistryError;

/// Root of `opencode/` under the platform's config directory. Honors
/// `ORCH_CONFIG_DIR` so tests (and operators) can redirect it.
pub fn opencode_dir() -> Result<PathBuf, RegistryError> {
    if let Ok(dir) = std::env::var("ORCH_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::config_dir().ok_or(RegistryError::NoConfigDir)?;
    Ok(base.join("opencode"))
}

/// `<user config>/opencode/orchestrator-device-registry.json`.
pub fn device_registry_path() -> Result<PathBuf, RegistryError> {
    Ok(opencode_dir()?.join("orchestrator-device-registry.json"))
}

/// `<user config>/opencode/orchestrator-locks/`.
pub fn locks_dir() -> Result<PathBuf, RegistryError> {
    Ok(opencode_dir()?.join("orchestrator-locks"))
}

/// `<user config>/opencode/orchestrator-locks/<profileId>.lock`.
pub fn lock_path(profile_id: &str) -> Result<PathBuf, RegistryError> {
    Ok(locks_dir()?.join(format!("{profile_id}.lock")))
}

/// `<user config>/opencode/orchestrator.json` (global config file, §6).
pub fn global_config_path() -> Result<PathBuf, RegistryError> {
    Ok(opencode_dir()?.join("orchestrator.json"))
}
