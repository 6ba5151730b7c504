// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    offline_to_online = { false, true, true },
    online_to_online = { true, true, false },
    online_to_offline = { true, false, false },
    offline_to_offline = { false, false, false },
)]
fn test_came_online_from(before: bool, after: bool, expected: bool) {
    let now = Utc::now();
    let previous = ConnectivityState::new(before, now);
    let next = ConnectivityState::new(after, now);
    assert_eq!(next.came_online_from(&previous), expected);
}

#[test]
fn test_state_serializes_camel_case() {
    let state = ConnectivityState::new(true, Utc::now());
    let json = serde_json::to_value(state).unwrap_or_default();
    assert_eq!(json["online"], true);
    assert_eq!(json["quality"], "unknown");
    assert!(json.get("lastChangedAt").is_some());
}
