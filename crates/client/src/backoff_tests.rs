// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    first = { 0, 100 },
    second = { 1, 200 },
    third = { 2, 400 },
    fourth = { 3, 800 },
    capped = { 4, 1000 },
    far_past_cap = { 40, 1000 },
)]
fn test_backoff_delay_doubles_until_cap(attempt: u32, expected_ms: u64) {
    let delay = backoff_delay(Duration::from_millis(100), attempt, Duration::from_secs(1));
    assert_eq!(delay, Duration::from_millis(expected_ms));
}

#[test]
fn test_delays_are_non_decreasing() {
    let base = Duration::from_millis(500);
    let max = Duration::from_secs(30);
    let delays: Vec<_> = (0..12).map(|a| backoff_delay(base, a, max)).collect();
    assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    assert!(delays.iter().all(|d| *d <= max));
}

#[test]
fn test_hint_overrides_computed_delay() {
    let policy = RetryPolicy::new(Duration::from_millis(10), Duration::from_secs(5));
    assert_eq!(policy.delay_for(0, Some(Duration::from_secs(2))), Duration::from_secs(2));
    assert_eq!(policy.delay_for(0, Some(Duration::from_secs(60))), Duration::from_secs(5));
    assert_eq!(policy.delay_for(2, None), Duration::from_millis(40));
}
