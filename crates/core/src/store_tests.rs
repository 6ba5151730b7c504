// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::kv::MemoryKv;
use chrono::Utc;
use serde_json::json;
use tempfile::tempdir;

fn transfer(amount: u64) -> QueuedMutation {
    QueuedMutation::new(
        MutationKind::Transaction,
        json!({"recipient": "509-3456-7890", "amount": amount, "currency": "HTG"}),
        Utc::now(),
    )
}

fn profile(name: &str) -> QueuedMutation {
    QueuedMutation::new(MutationKind::ProfileUpdate, json!({"displayName": name}), Utc::now())
}

#[test]
fn insert_assigns_increasing_sequence() {
    let mut store = MutationStore::with_kv(MemoryKv::new()).unwrap();

    let a = store.insert(transfer(100)).unwrap();
    let b = store.insert(profile("Ti Jan")).unwrap();
    let c = store.insert(transfer(200)).unwrap();

    assert!(a.seq < b.seq && b.seq < c.seq);

    let all = store.all().unwrap();
    let ids: Vec<&str> = all.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]);
}

#[test]
fn insert_same_id_keeps_single_record() {
    let mut store = MutationStore::with_kv(MemoryKv::new()).unwrap();
    let first = store.insert(transfer(500)).unwrap();

    let mut duplicate = first.clone();
    duplicate.payload = json!({"amount": 999});
    let returned = store.insert(duplicate).unwrap();

    assert_eq!(returned.payload, first.payload);
    assert_eq!(store.list(MutationKind::Transaction).unwrap().len(), 1);
}

#[test]
fn collections_are_separate() {
    let mut store = MutationStore::with_kv(MemoryKv::new()).unwrap();
    let tx = store.insert(transfer(1)).unwrap();
    let pu = store.insert(profile("a")).unwrap();

    assert_eq!(store.list(MutationKind::Transaction).unwrap().len(), 1);
    assert_eq!(store.list(MutationKind::ProfileUpdate).unwrap().len(), 1);
    assert_eq!(store.find(&pu.id).unwrap().unwrap().kind, MutationKind::ProfileUpdate);
    assert_eq!(store.find(&tx.id).unwrap().unwrap().kind, MutationKind::Transaction);
    assert!(store.find("missing").unwrap().is_none());
}

#[test]
fn update_requires_existing_record() {
    let mut store = MutationStore::with_kv(MemoryKv::new()).unwrap();
    let orphan = transfer(1);
    assert!(matches!(store.update(&orphan), Err(Error::MutationNotFound(_))));

    let mut stored = store.insert(transfer(2)).unwrap();
    stored.mark_in_flight();
    store.update(&stored).unwrap();
    assert_eq!(
        store.get(MutationKind::Transaction, &stored.id).unwrap().unwrap().status,
        MutationStatus::InFlight
    );
}

#[test]
fn remove_deletes_record() {
    let mut store = MutationStore::with_kv(MemoryKv::new()).unwrap();
    let stored = store.insert(transfer(2)).unwrap();

    assert!(store.remove(MutationKind::Transaction, &stored.id).unwrap());
    assert!(!store.remove(MutationKind::Transaction, &stored.id).unwrap());
    assert!(store.all().unwrap().is_empty());
}

#[test]
fn reopen_reverts_in_flight_to_pending() {
    let mut store = MutationStore::with_kv(MemoryKv::new()).unwrap();
    let mut stored = store.insert(transfer(500)).unwrap();
    stored.mark_in_flight();
    store.update(&stored).unwrap();

    let mut failed = store.insert(profile("b")).unwrap();
    failed.fail("invalid phone number");
    store.update(&failed).unwrap();

    let reopened = MutationStore::with_kv(store.into_inner()).unwrap();

    let recovered = reopened.get(MutationKind::Transaction, &stored.id).unwrap().unwrap();
    assert_eq!(recovered.status, MutationStatus::Pending);
    assert_eq!(recovered.attempts, 0);
    assert!(reopened.with_status(MutationStatus::InFlight).unwrap().is_empty());
    assert_eq!(reopened.with_status(MutationStatus::Failed).unwrap().len(), 1);
}

#[test]
fn reopen_continues_sequence() {
    let mut store = MutationStore::with_kv(MemoryKv::new()).unwrap();
    let a = store.insert(transfer(1)).unwrap();

    let mut reopened = MutationStore::with_kv(store.into_inner()).unwrap();
    let b = reopened.insert(transfer(2)).unwrap();
    assert!(b.seq > a.seq);
}

#[test]
fn sqlite_store_persists_across_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("queue.db");

    let id = {
        let mut store = MutationStore::open(&path).unwrap();
        let mut m = store.insert(transfer(500)).unwrap();
        m.mark_in_flight();
        store.update(&m).unwrap();
        m.id
    };

    let store = MutationStore::open(&path).unwrap();
    let m = store.find(&id).unwrap().unwrap();
    assert!(m.is_pending());
    assert_eq!(m.payload["currency"], "HTG");
}

#[test]
fn evict_failed_over_drops_oldest() {
    let mut store = MutationStore::with_kv(MemoryKv::new()).unwrap();
    let mut ids = Vec::new();
    for i in 0..4 {
        let mut m = store.insert(transfer(i)).unwrap();
        m.fail("rejected");
        store.update(&m).unwrap();
        ids.push(m.id);
    }
    let pending = store.insert(transfer(10)).unwrap();

    let evicted = store.evict_failed_over(2).unwrap();
    assert_eq!(evicted, vec![ids[0].clone(), ids[1].clone()]);

    let failed = store.with_status(MutationStatus::Failed).unwrap();
    assert_eq!(failed.len(), 2);
    assert!(store.find(&pending.id).unwrap().is_some());
    assert!(store.evict_failed_over(2).unwrap().is_empty());
}

#[test]
fn corrupted_record_is_reported() {
    let mut kv = MemoryKv::new();
    kv.put("transactions/bad", "not json").unwrap();

    let result = MutationStore::with_kv(kv);
    assert!(matches!(result, Err(Error::CorruptedData(_))));
}
