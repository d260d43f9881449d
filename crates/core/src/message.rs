// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message — a unit relayed through the Message Bus singleton (spec §3, §4.6).

use crate::ids::MessageId;
use serde::{Deserialize, Serialize};

/// Reserved `from` value used when the orchestrator itself originates a
/// message rather than relaying one worker's output to another.
pub const ORCHESTRATOR_SENDER: &str = "orchestrator";

/// A message passed between workers (or from the orchestrator to a worker)
/// via the Bridge's `/v1/message` and `/v1/inbox` routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub from: String,
    pub to: String,
    pub topic: Option<String>,
    pub text: String,
    pub created_at_ms: u64,
}

impl Message {
    pub fn new(from: impl Into<String>, to: impl Into<String>, text: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id: MessageId::new(),
            from: from.into(),
            to: to.into(),
            topic: None,
            text: text.into(),
            created_at_ms: now_ms,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn is_from_orchestrator(&self) -> bool {
        self.from == ORCHESTRATOR_SENDER
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
