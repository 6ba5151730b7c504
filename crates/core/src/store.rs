// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable mutation store.
//!
//! Persists [`QueuedMutation`] records in two collections, `transactions` and
//! `profileUpdates`, each keyed by the mutation id. Opening the store reverts
//! any `InFlight` record to `Pending`: a delivery that was running when the
//! process died is retried under the same id.

use std::path::Path;

use crate::error::{Error, Result};
use crate::kv::{KvStore, SqliteKv};
use crate::mutation::{store_key, MutationKind, MutationStatus, QueuedMutation};

/// Mutation records on top of a [`KvStore`].
pub struct MutationStore<K: KvStore = SqliteKv> {
    kv: K,
    next_seq: u64,
}

impl MutationStore<SqliteKv> {
    /// Open the SQLite-backed store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::with_kv(SqliteKv::open(path)?)
    }
}

impl<K: KvStore> MutationStore<K> {
    /// Wrap an existing key-value store, recovering interrupted deliveries.
    pub fn with_kv(kv: K) -> Result<Self> {
        let mut store = MutationStore { kv, next_seq: 1 };
        let all = store.all()?;

        store.next_seq = all.iter().map(|m| m.seq).max().map_or(1, |s| s.saturating_add(1));

        let mut recovered = 0usize;
        for mut mutation in all.into_iter().filter(|m| m.status == MutationStatus::InFlight) {
            mutation.reset_to_pending();
            store.write(&mutation)?;
            recovered += 1;
        }
        if recovered > 0 {
            tracing::info!(recovered, "reverted interrupted in-flight mutations to pending");
        }

        Ok(store)
    }

    /// Persist a new mutation and return it with its sequence number.
    ///
    /// If a record with the same id already exists it is returned unchanged;
    /// an id is never stored twice.
    pub fn insert(&mut self, mut mutation: QueuedMutation) -> Result<QueuedMutation> {
        if let Some(existing) = self.get(mutation.kind, &mutation.id)? {
            return Ok(existing);
        }
        mutation.seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.write(&mutation)?;
        Ok(mutation)
    }

    /// Overwrite an existing record.
    pub fn update(&mut self, mutation: &QueuedMutation) -> Result<()> {
        if self.kv.get(&mutation.store_key())?.is_none() {
            return Err(Error::MutationNotFound(mutation.id.clone()));
        }
        self.write(mutation)
    }

    /// Delete a record. Returns true if it existed.
    pub fn remove(&mut self, kind: MutationKind, id: &str) -> Result<bool> {
        self.kv.delete(&store_key(kind, id))
    }

    pub fn get(&self, kind: MutationKind, id: &str) -> Result<Option<QueuedMutation>> {
        let key = store_key(kind, id);
        self.kv.get(&key)?.map(|raw| decode(&key, &raw)).transpose()
    }

    /// Look a mutation up by id in every collection.
    pub fn find(&self, id: &str) -> Result<Option<QueuedMutation>> {
        for kind in MutationKind::ALL {
            if let Some(m) = self.get(kind, id)? {
                return Ok(Some(m));
            }
        }
        Ok(None)
    }

    /// All records of one kind in creation order.
    pub fn list(&self, kind: MutationKind) -> Result<Vec<QueuedMutation>> {
        let prefix = format!("{}/", kind.collection());
        let mut items = self
            .kv
            .list_prefix(&prefix)?
            .into_iter()
            .map(|(key, raw)| decode(&key, &raw))
            .collect::<Result<Vec<_>>>()?;
        items.sort_by(QueuedMutation::creation_order);
        Ok(items)
    }

    /// All records across kinds in creation order.
    pub fn all(&self) -> Result<Vec<QueuedMutation>> {
        let mut items = Vec::new();
        for kind in MutationKind::ALL {
            items.extend(self.list(kind)?);
        }
        items.sort_by(QueuedMutation::creation_order);
        Ok(items)
    }

    pub fn with_status(&self, status: MutationStatus) -> Result<Vec<QueuedMutation>> {
        Ok(self.all()?.into_iter().filter(|m| m.status == status).collect())
    }

    /// Evict the oldest failed records until at most `max` remain.
    ///
    /// Returns the ids that were removed.
    pub fn evict_failed_over(&mut self, max: usize) -> Result<Vec<String>> {
        let failed = self.with_status(MutationStatus::Failed)?;
        if failed.len() <= max {
            return Ok(Vec::new());
        }

        let excess = failed.len() - max;
        let mut evicted = Vec::with_capacity(excess);
        for mutation in failed.into_iter().take(excess) {
            self.remove(mutation.kind, &mutation.id)?;
            evicted.push(mutation.id);
        }
        Ok(evicted)
    }

    /// Release the underlying key-value store.
    pub fn into_inner(self) -> K {
        self.kv
    }

    fn write(&mut self, mutation: &QueuedMutation) -> Result<()> {
        let json = serde_json::to_string(mutation)?;
        self.kv.put(&mutation.store_key(), &json)
    }
}

fn decode(key: &str, raw: &str) -> Result<QueuedMutation> {
    serde_json::from_str(raw)
        .map_err(|e| Error::CorruptedData(format!("invalid mutation record '{key}': {e}")))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
