// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /v1/inbox` query and response bodies (spec §4.4).

use serde::{Deserialize, Serialize};

fn default_limit() -> u32 {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboxQuery {
    pub to: String,
    #[serde(default)]
    pub after: Option<u64>,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct InboxEntry {
    pub id: String,
    pub from: String,
    pub to: String,
    pub topic: Option<String>,
    pub text: String,
    #[serde(rename = "createdAt")]
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InboxResponse {
    pub messages: Vec<InboxEntry>,
}

#[cfg(test)]
#[path = "inbox_tests.rs"]
mod tests;
