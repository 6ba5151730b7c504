// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::tempdir;

fn stores() -> Vec<(&'static str, Box<dyn KvStore>)> {
    vec![
        ("memory", Box::new(MemoryKv::new())),
        ("sqlite", Box::new(SqliteKv::open_in_memory().unwrap())),
    ]
}

#[test]
fn put_get_delete() {
    for (name, mut store) in stores() {
        assert_eq!(store.get("a").unwrap(), None, "{name}");

        store.put("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"), "{name}");

        store.put("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"), "{name}");

        assert!(store.delete("a").unwrap(), "{name}");
        assert!(!store.delete("a").unwrap(), "{name}");
        assert_eq!(store.get("a").unwrap(), None, "{name}");
    }
}

#[test]
fn list_prefix_is_sorted_and_scoped() {
    for (name, mut store) in stores() {
        store.put("transactions/b", "2").unwrap();
        store.put("transactions/a", "1").unwrap();
        store.put("profileUpdates/a", "3").unwrap();
        store.put("transactionsx", "4").unwrap();

        let rows = store.list_prefix("transactions/").unwrap();
        let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["transactions/a", "transactions/b"], "{name}");

        assert_eq!(store.list_prefix("").unwrap().len(), 4, "{name}");
        assert!(store.list_prefix("nothing/").unwrap().is_empty(), "{name}");
    }
}

#[test]
fn empty_key_rejected() {
    for (name, mut store) in stores() {
        assert!(matches!(store.put("", "x"), Err(Error::InvalidKey(_))), "{name}");
    }
}

#[test]
fn sqlite_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("queue.db");

    {
        let mut store = SqliteKv::open(&path).unwrap();
        store.put("transactions/1", "{}").unwrap();
    }

    let store = SqliteKv::open(&path).unwrap();
    assert_eq!(store.get("transactions/1").unwrap().as_deref(), Some("{}"));
}
