// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Provider-catalog abstraction needed by Model Resolution (spec §4.7) to
//! resolve a symbolic model tag without the Spawner coupling directly to a
//! live worker's HTTP surface.

use async_trait::async_trait;

use crate::client::{ProviderCatalog, ProviderEntry, WorkerClient};
use crate::error::AdapterError;

/// A handle capable of enumerating providers, as required by `acquire`
/// when the profile's model is a symbolic tag (spec §4.1 step 6).
#[async_trait]
pub trait ProviderCatalogClient: Send + Sync {
    async fn catalog(&self) -> Result<ProviderCatalog, AdapterError>;
}

/// Queries a worker already running (itself or a sibling) for its provider
/// catalog.
pub struct WorkerProviderCatalogClient {
    client: WorkerClient,
    base_url: String,
}

impl WorkerProviderCatalogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { client: WorkerClient::new(), base_url: base_url.into() }
    }
}

#[async_trait]
impl ProviderCatalogClient for WorkerProviderCatalogClient {
    async fn catalog(&self) -> Result<ProviderCatalog, AdapterError> {
        self.client.provider_catalog(&self.base_url).await
    }
}

/// Fixed, in-memory provider catalog for tests and offline tooling.
pub struct FakeProviderCatalogClient {
    catalog: ProviderCatalog,
}

impl FakeProviderCatalogClient {
    pub fn new(providers: Vec<ProviderEntry>) -> Self {
        Self { catalog: ProviderCatalog { providers } }
    }
}

#[async_trait]
impl ProviderCatalogClient for FakeProviderCatalogClient {
    async fn catalog(&self) -> Result<ProviderCatalog, AdapterError> {
        Ok(ProviderCatalog { providers: self.catalog.providers.clone() })
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
