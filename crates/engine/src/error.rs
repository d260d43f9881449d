// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversions from the lower-level crates' error types into the
//! taxonomy-complete `OrchError` (spec §7). Plain functions rather than
//! `From` impls: neither `OrchError` nor `RegistryError`/`AdapterError` is
//! defined in this crate, so a blanket `From` would violate the orphan rule.

use orch_adapters::AdapterError;
use orch_core::OrchError;
use orch_registry::RegistryError;

pub fn from_registry_err(e: RegistryError) -> OrchError {
    match e {
        RegistryError::LockTimeout { profile, timeout_ms } => {
            OrchError::LockTimeout { profile, timeout_ms }
        }
        RegistryError::NoConfigDir => OrchError::ConfigInvalid("no config directory".into()),
        RegistryError::Io(e) => OrchError::Io(e),
        RegistryError::Serde(e) => OrchError::Serde(e),
    }
}

pub fn from_adapter_err(worker: &str, e: AdapterError) -> OrchError {
    match e {
        AdapterError::SpawnTimeout { timeout_ms } => {
            OrchError::SpawnTimeout { worker: worker.to_string(), timeout_ms }
        }
        AdapterError::SpawnExit => OrchError::SpawnExit { worker: worker.to_string() },
        AdapterError::SessionCreate(message) => {
            OrchError::SessionCreate { worker: worker.to_string(), message }
        }
        AdapterError::WorkerEmpty => OrchError::WorkerEmpty(worker.to_string()),
        AdapterError::Timeout(_) => OrchError::WorkerNotReady(worker.to_string()),
        AdapterError::Http(e) => OrchError::SessionCreate { worker: worker.to_string(), message: e.to_string() },
        AdapterError::Io(e) => OrchError::Io(e),
    }
}
