// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    transaction = { "transaction", MutationKind::Transaction },
    transactions = { "transactions", MutationKind::Transaction },
    profile_update = { "profile_update", MutationKind::ProfileUpdate },
    profile_dash = { "profile-update", MutationKind::ProfileUpdate },
    collection_name = { "profileUpdates", MutationKind::ProfileUpdate },
    upper = { "TRANSACTION", MutationKind::Transaction },
)]
fn kind_from_str_valid(input: &str, expected: MutationKind) {
    assert_eq!(input.parse::<MutationKind>().unwrap(), expected);
}

#[parameterized(
    empty = { "" },
    unknown = { "refund" },
)]
fn kind_from_str_invalid(input: &str) {
    assert!(input.parse::<MutationKind>().is_err());
}

#[parameterized(
    transaction = { MutationKind::Transaction, "transactions" },
    profile = { MutationKind::ProfileUpdate, "profileUpdates" },
)]
fn kind_collection(kind: MutationKind, expected: &str) {
    assert_eq!(kind.collection(), expected);
}

#[parameterized(
    pending = { "pending", MutationStatus::Pending },
    in_flight = { "in_flight", MutationStatus::InFlight },
    failed = { "failed", MutationStatus::Failed },
)]
fn status_from_str_valid(input: &str, expected: MutationStatus) {
    assert_eq!(input.parse::<MutationStatus>().unwrap(), expected);
    assert_eq!(expected.as_str(), input);
}

#[test]
fn new_mutation_is_pending_with_unique_id() {
    let a = QueuedMutation::new(MutationKind::Transaction, json!({"amount": 1}), Utc::now());
    let b = QueuedMutation::new(MutationKind::Transaction, json!({"amount": 1}), Utc::now());

    assert_ne!(a.id, b.id);
    assert!(a.is_pending());
    assert_eq!(a.attempts, 0);
    assert!(a.last_error.is_none());
}

#[test]
fn store_key_uses_collection() {
    let m = QueuedMutation::with_id(
        "abc".to_string(),
        MutationKind::ProfileUpdate,
        json!({}),
        Utc::now(),
    );
    assert_eq!(m.store_key(), "profileUpdates/abc");
}

#[test]
fn lifecycle_transitions_track_attempts() {
    let mut m = QueuedMutation::new(MutationKind::Transaction, json!({}), Utc::now());

    m.mark_in_flight();
    assert_eq!(m.status, MutationStatus::InFlight);

    m.defer("server error");
    assert!(m.is_pending());
    assert_eq!(m.attempts, 1);

    m.mark_in_flight();
    m.fail("insufficient funds");
    assert!(m.is_failed());
    assert_eq!(m.attempts, 2);
    assert_eq!(m.last_error.as_deref(), Some("insufficient funds"));

    m.reset_to_pending();
    assert!(m.is_pending());
    assert_eq!(m.attempts, 2);
}

#[test]
fn serializes_with_camel_case_fields() {
    let mut m = QueuedMutation::with_id(
        "id-1".to_string(),
        MutationKind::Transaction,
        json!({"amount": 500, "currency": "HTG"}),
        Utc::now(),
    );
    m.fail("nope");

    let value = serde_json::to_value(&m).unwrap();
    assert_eq!(value["kind"], "transaction");
    assert_eq!(value["status"], "failed");
    assert_eq!(value["lastError"], "nope");
    assert!(value.get("createdAt").is_some());
}

#[test]
fn creation_order_prefers_sequence() {
    let now = Utc::now();
    let mut a = QueuedMutation::new(MutationKind::Transaction, json!({}), now);
    let mut b = QueuedMutation::new(MutationKind::Transaction, json!({}), now);
    a.seq = 2;
    b.seq = 1;

    let mut items = vec![a.clone(), b.clone()];
    items.sort_by(QueuedMutation::creation_order);
    assert_eq!(items[0].id, b.id);
    assert_eq!(items[1].id, a.id);
}
