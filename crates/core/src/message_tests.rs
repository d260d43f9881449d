// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_message_has_no_topic_by_default() {
    let msg = Message::new("reviewer", "implementer", "please fix", 10);
    assert!(msg.topic.is_none());
    assert_eq!(msg.text, "please fix");
    assert_eq!(msg.created_at_ms, 10);
}

#[test]
fn with_topic_sets_topic() {
    let msg = Message::new("a", "b", "hi", 0).with_topic("handoff");
    assert_eq!(msg.topic.as_deref(), Some("handoff"));
}

#[test]
fn is_from_orchestrator_checks_reserved_sender() {
    let from_orch = Message::new(ORCHESTRATOR_SENDER, "a", "go", 0);
    assert!(from_orch.is_from_orchestrator());

    let from_worker = Message::new("a", "b", "go", 0);
    assert!(!from_worker.is_from_orchestrator());
}

#[test]
fn message_ids_are_unique_across_construction() {
    let a = Message::new("a", "b", "x", 0);
    let b = Message::new("a", "b", "x", 0);
    assert_ne!(a.id, b.id);
}
