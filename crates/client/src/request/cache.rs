// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory response cache with per-entry TTL.
//!
//! Entries are keyed by request path plus normalized query, so realtime
//! invalidation can drop whole path families by prefix.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// Invalidations remembered for [`ResponseCache::insert_since`]. A read that
/// started before the oldest remembered one is never stored.
const INVALIDATION_LOG: usize = 256;

/// Builds the cache key for a GET: the path, then query pairs sorted by key
/// and value so parameter order does not matter.
pub fn cache_key(path: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let mut pairs: Vec<_> = query.iter().collect();
    pairs.sort();
    let query = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    format!("{path}?{query}")
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub key: String,
    pub payload: Arc<T>,
    pub stored_at_ms: u64,
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// An entry is never served once `now > stored_at + ttl`.
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);
        now_ms <= self.stored_at_ms.saturating_add(ttl_ms)
    }
}

#[derive(Debug)]
pub struct ResponseCache<T = serde_json::Value> {
    entries: HashMap<String, CacheEntry<T>>,
    /// Bumped by every `invalidate` and `clear`.
    generation: u64,
    /// `(generation, prefix)` of recent invalidations; `clear` logs `""`.
    invalidations: VecDeque<(u64, String)>,
}

impl<T> Default for ResponseCache<T> {
    fn default() -> Self {
        ResponseCache { entries: HashMap::new(), generation: 0, invalidations: VecDeque::new() }
    }
}

impl<T> ResponseCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh payload, dropping the entry if it has expired.
    pub fn get(&mut self, key: &str, now_ms: u64) -> Option<Arc<T>> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now_ms) => Some(Arc::clone(&entry.payload)),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&mut self, key: String, payload: Arc<T>, now_ms: u64, ttl: Duration) {
        let entry = CacheEntry { key: key.clone(), payload, stored_at_ms: now_ms, ttl };
        self.entries.insert(key, entry);
    }

    /// Current invalidation generation. Capture it before fetching and pass
    /// it to [`ResponseCache::insert_since`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stores a payload fetched after `generation` was read, unless an
    /// invalidation covering `key` happened since. Returns whether it was
    /// stored.
    pub fn insert_since(
        &mut self,
        key: String,
        payload: Arc<T>,
        now_ms: u64,
        ttl: Duration,
        generation: u64,
    ) -> bool {
        if self.invalidated_since(&key, generation) {
            return false;
        }
        self.insert(key, payload, now_ms, ttl);
        true
    }

    /// Drops every entry whose key starts with `prefix`. Returns how many
    /// were removed.
    pub fn invalidate(&mut self, prefix: &str) -> usize {
        self.record_invalidation(prefix);
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before - self.entries.len()
    }

    pub fn purge_expired(&mut self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now_ms));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.record_invalidation("");
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn record_invalidation(&mut self, prefix: &str) {
        self.generation += 1;
        self.invalidations.push_back((self.generation, prefix.to_string()));
        if self.invalidations.len() > INVALIDATION_LOG {
            self.invalidations.pop_front();
        }
    }

    fn invalidated_since(&self, key: &str, generation: u64) -> bool {
        if generation >= self.generation {
            return false;
        }
        // Generations are consecutive; a gap means the log was trimmed.
        match self.invalidations.front() {
            Some((oldest, _)) if *oldest <= generation + 1 => self
                .invalidations
                .iter()
                .any(|(g, prefix)| *g > generation && key.starts_with(prefix.as_str())),
            _ => true,
        }
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
