// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message Bus — per-recipient FIFO of worker-to-worker messages (spec §4.6).

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use orch_core::{Clock, Message};
use parking_lot::Mutex;

/// Per-recipient cap; oldest messages are dropped once exceeded.
pub const MAX_MESSAGES_PER_RECIPIENT: usize = 1000;

pub const DEFAULT_INBOX_LIMIT: usize = 50;

/// Per-recipient bounded FIFO message store (spec §4.6 "Message Bus").
#[derive(Clone)]
pub struct MessageBus {
    inboxes: Arc<Mutex<HashMap<String, VecDeque<Message>>>>,
    clock: Arc<dyn Clock>,
}

impl MessageBus {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { inboxes: Arc::new(Mutex::new(HashMap::new())), clock }
    }

    /// Append a message and return the persisted record (spec §4.4
    /// "POST /v1/message").
    pub fn send(&self, from: String, to: String, topic: Option<String>, text: String) -> Message {
        let now = self.clock.now_ms();
        let mut message = Message::new(from, to.clone(), text, now);
        if let Some(topic) = topic {
            message = message.with_topic(topic);
        }

        let mut inboxes = self.inboxes.lock();
        let inbox = inboxes.entry(to).or_default();
        inbox.push_back(message.clone());
        while inbox.len() > MAX_MESSAGES_PER_RECIPIENT {
            inbox.pop_front();
        }
        message
    }

    /// Messages addressed to `to` with `createdAt > after`, up to `limit`,
    /// ordered by creation (insertion order breaks ties, spec §4.6, §8).
    pub fn list(&self, to: &str, after: u64, limit: usize) -> Vec<Message> {
        let inboxes = self.inboxes.lock();
        match inboxes.get(to) {
            Some(inbox) => inbox.iter().filter(|m| m.created_at_ms > after).take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "message_bus_tests.rs"]
mod tests;
