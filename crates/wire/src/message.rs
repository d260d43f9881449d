// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /v1/message` request/response bodies (spec §4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    pub from: String,
    pub to: String,
    pub topic: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub ok: bool,
    pub id: String,
    #[serde(rename = "createdAt")]
    pub created_at_ms: u64,
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
