// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration loading — the two-layer (global + project) document
//! described in spec §6, deep-merged with array-replace semantics for
//! `profiles`/`workers`.

use std::path::{Path, PathBuf};

use orch_core::WorkerProfile;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A profile reference in `profiles`/`workers`: either a bare id string or an
/// inline full profile object (spec §6 "Fields recognized").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileRef {
    Id(String),
    Inline(WorkerProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_base_port")]
    pub base_port: u16,
    #[serde(default)]
    pub auto_spawn: bool,
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout: u64,
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval: u64,
    #[serde(default)]
    pub profiles: Vec<ProfileRef>,
    #[serde(default)]
    pub workers: Vec<ProfileRef>,
    /// Presentational/ancillary blocks this layer does not interpret
    /// structurally, kept as raw JSON so unknown sub-fields round-trip.
    #[serde(default)]
    pub ui: Value,
    #[serde(default)]
    pub notifications: Value,
    #[serde(default)]
    pub agent: Value,
    #[serde(default)]
    pub commands: Value,
    #[serde(default)]
    pub pruning: Value,
    #[serde(default)]
    pub workflows: Value,
    #[serde(default)]
    pub security: Value,
}

fn default_base_port() -> u16 {
    4100
}

fn default_startup_timeout_ms() -> u64 {
    30_000
}

fn default_health_check_interval_ms() -> u64 {
    60_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_port: default_base_port(),
            auto_spawn: false,
            startup_timeout: default_startup_timeout_ms(),
            health_check_interval: default_health_check_interval_ms(),
            profiles: Vec::new(),
            workers: Vec::new(),
            ui: Value::Null,
            notifications: Value::Null,
            agent: Value::Null,
            commands: Value::Null,
            pruning: Value::Null,
            workflows: Value::Null,
            security: Value::Null,
        }
    }
}

/// Global config path: `<user config>/opencode/orchestrator.json`.
pub fn global_config_path() -> Result<PathBuf, orch_registry::RegistryError> {
    orch_registry::paths::global_config_path()
}

/// Project config path, preferring `.opencode/orchestrator.json` and falling
/// back to a legacy project-root location (spec §6 "legacy fallback").
pub fn project_config_paths(project_dir: &Path) -> [PathBuf; 2] {
    [project_dir.join(".opencode").join("orchestrator.json"), project_dir.join("orchestrator.json")]
}

/// Load and deep-merge the global and project configuration layers. Never
/// fails: invalid JSON or a missing file degrades to an empty partial at
/// that layer (spec §6 "Invalid JSON degrades to empty partial", §7
/// `CONFIG_INVALID`). Callers that need a hard failure should validate the
/// raw files themselves before calling this.
pub fn load_config(project_dir: Option<&Path>) -> Config {
    let mut merged = Value::Object(serde_json::Map::new());

    if let Ok(path) = global_config_path() {
        merge_in_place(&mut merged, &read_partial(&path));
    }

    if let Some(project_dir) = project_dir {
        for path in project_config_paths(project_dir) {
            if path.exists() {
                merge_in_place(&mut merged, &read_partial(&path));
                break;
            }
        }
    }

    serde_json::from_value(merged).unwrap_or_default()
}

fn read_partial(path: &Path) -> Value {
    match std::fs::read(path) {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or(Value::Object(serde_json::Map::new())),
        Err(_) => Value::Object(serde_json::Map::new()),
    }
}

/// Object keys deep-merge; `profiles` and `workers` arrays **replace** rather
/// than concatenate (spec §6 "Merging rules").
fn merge_in_place(base: &mut Value, overlay: &Value) {
    const REPLACE_ARRAYS: &[&str] = &["profiles", "workers"];

    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) if REPLACE_ARRAYS.contains(&key.as_str()) => {
                        *existing = overlay_value.clone();
                    }
                    Some(existing) if existing.is_object() && overlay_value.is_object() => {
                        merge_in_place(existing, overlay_value);
                    }
                    _ => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
