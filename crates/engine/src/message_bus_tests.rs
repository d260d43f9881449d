// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use orch_core::FakeClock;

use super::*;

#[test]
fn send_then_list_returns_the_message() {
    let bus = MessageBus::new(Arc::new(FakeClock::default()));
    bus.send("A".into(), "B".into(), None, "hi".into());
    let inbox = bus.list("B", 0, DEFAULT_INBOX_LIMIT);
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].text, "hi");
}

#[test]
fn list_filters_by_after_and_respects_limit() {
    let clock = FakeClock::default();
    let bus = MessageBus::new(Arc::new(clock.clone()));
    bus.send("A".into(), "B".into(), None, "one".into());
    let cutoff = clock.now_ms();
    clock.advance_ms(1);
    bus.send("A".into(), "B".into(), None, "two".into());
    clock.advance_ms(1);
    bus.send("A".into(), "B".into(), None, "three".into());

    let after_cutoff = bus.list("B", cutoff, DEFAULT_INBOX_LIMIT);
    assert_eq!(after_cutoff.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(), vec!["two", "three"]);

    let limited = bus.list("B", 0, 1);
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].text, "one");
}

#[test]
fn messages_for_different_recipients_do_not_cross_contaminate() {
    let bus = MessageBus::new(Arc::new(FakeClock::default()));
    bus.send("A".into(), "B".into(), None, "for b".into());
    bus.send("A".into(), "C".into(), None, "for c".into());
    assert_eq!(bus.list("B", 0, 10).len(), 1);
    assert_eq!(bus.list("C", 0, 10).len(), 1);
    assert!(bus.list("D", 0, 10).is_empty());
}

#[test]
fn inbox_is_trimmed_to_the_per_recipient_cap() {
    let clock = FakeClock::default();
    let bus = MessageBus::new(Arc::new(clock.clone()));
    for i in 0..(MAX_MESSAGES_PER_RECIPIENT + 10) {
        bus.send("A".into(), "B".into(), None, format!("msg-{i}"));
        clock.advance_ms(1);
    }
    let all = bus.list("B", 0, MAX_MESSAGES_PER_RECIPIENT + 10);
    assert_eq!(all.len(), MAX_MESSAGES_PER_RECIPIENT);
    assert_eq!(all[0].text, "msg-10");
}

#[test]
fn ordering_respects_created_at_for_any_pair_returned_together() {
    let clock = FakeClock::default();
    let bus = MessageBus::new(Arc::new(clock.clone()));
    bus.send("A".into(), "B".into(), None, "m1".into());
    clock.advance_ms(5);
    bus.send("A".into(), "B".into(), None, "m2".into());

    let listed = bus.list("B", 0, 10);
    for window in listed.windows(2) {
        assert!(window[0].created_at_ms <= window[1].created_at_ms);
    }
}
