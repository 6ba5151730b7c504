// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message type -> cache path prefixes.

use std::collections::BTreeMap;

use lajan_core::message_type;
use serde::{Deserialize, Serialize};

/// Which cached paths a realtime message makes stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvalidationMap(BTreeMap<String, Vec<String>>);

impl InvalidationMap {
    pub fn new() -> Self {
        InvalidationMap(BTreeMap::new())
    }

    pub fn insert(&mut self, message_type: impl Into<String>, prefixes: Vec<String>) {
        self.0.insert(message_type.into(), prefixes);
    }

    pub fn prefixes_for(&self, message_type: &str) -> &[String] {
        self.0.get(message_type).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for InvalidationMap {
    fn default() -> Self {
        let mut map = InvalidationMap::new();
        let mut add = |kind: &str, prefixes: &[&str]| {
            map.insert(kind, prefixes.iter().map(|p| p.to_string()).collect());
        };
        add(message_type::BALANCE_UPDATED, &["/wallet", "/balance"]);
        add(message_type::TRANSACTION_CREATED, &["/transactions", "/wallet"]);
        add(message_type::TRANSACTION_STATUS_CHANGED, &["/transactions", "/wallet"]);
        add(message_type::NOTIFICATION, &["/notifications"]);
        add("merchant_aggregate_updated", &["/merchant/stats"]);
        add("agent_aggregate_updated", &["/agent/stats"]);
        map
    }
}

impl FromIterator<(String, Vec<String>)> for InvalidationMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        InvalidationMap(iter.into_iter().collect())
    }
}
