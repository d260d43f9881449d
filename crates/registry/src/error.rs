// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("could not determine the platform config directory")]
    NoConfigDir,

    #[error("profile lock for '{profile}' not acquired within {timeout_ms}ms")]
    LockTimeout { profile: String, timeout_ms: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoConfigDir => "NO_CONFIG_DIR",
            Self::LockTimeout { .. } => "LOCK_TIMEOUT",
            Self::Io(_) => "IO",
            Self::Serde(_) => "SERDE",
        }
    }
}
