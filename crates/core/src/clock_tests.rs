// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn fake_clock_advances_monotonically() {
    let clock = FakeClock::new(1_000);
    assert_eq!(clock.now_ms(), 1_000);
    clock.advance_ms(250);
    assert_eq!(clock.now_ms(), 1_250);
}

#[test]
fn fake_clock_set_overrides() {
    let clock = FakeClock::new(0);
    clock.set_ms(9_999);
    assert_eq!(clock.now_ms(), 9_999);
}

#[parameterized(
    zero = { 0, 0, 0 },
    small = { 10, 5, 15 },
    large = { 1_000_000, 1, 1_000_001 },
)]
fn fake_clock_advance_table(start: u64, delta: u64, expected: u64) {
    let clock = FakeClock::new(start);
    clock.advance_ms(delta);
    assert_eq!(clock.now_ms(), expected);
}

#[test]
fn system_clock_is_plausible() {
    let clock = SystemClock;
    // Should be well past this crate's epoch; a sanity bound, not a precise check.
    assert!(clock.now_ms() > 1_700_000_000_000);
}
