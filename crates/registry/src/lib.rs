// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! orch-registry: the machine-wide device registry and cross-process
//! profile lock (spec §4.2, §4.3).

pub mod device_registry;
mod error;
pub mod paths;
pub mod profile_lock;

pub use device_registry::DeviceRegistry;
pub use error::RegistryError;
pub use profile_lock::{ProfileLock, ProfileLockGuard};
