// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync coordinator: the offline queue's replay engine.
//!
//! Mutations are persisted before any network attempt. A pass walks pending
//! mutations in creation order, one at a time, and partitions the outcome:
//! delivered mutations are deleted, transient failures stay pending (and
//! block later mutations of the same kind for the rest of the pass), terminal
//! failures move to the failed partition.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use lajan_core::{
    ClockSource, KvStore, MutationKind, MutationStatus, MutationStore, QueuedMutation,
    SqliteKv, SystemClock,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::connectivity::ConnectivityMonitor;
use crate::error::{Error, Result};
use crate::request::{Method, RequestClient, RequestOptions};

/// Endpoint a mutation kind is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub method: Method,
    pub path: String,
}

impl Route {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Route { method, path: path.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routes {
    #[serde(default = "default_transaction_route")]
    pub transaction: Route,
    #[serde(default = "default_profile_update_route")]
    pub profile_update: Route,
}

fn default_transaction_route() -> Route {
    Route::new(Method::Post, "/transactions")
}

fn default_profile_update_route() -> Route {
    Route::new(Method::Patch, "/profile")
}

impl Default for Routes {
    fn default() -> Self {
        Routes { transaction: default_transaction_route(), profile_update: default_profile_update_route() }
    }
}

impl Routes {
    pub fn route_for(&self, kind: MutationKind) -> &Route {
        match kind {
            MutationKind::Transaction => &self.transaction,
            MutationKind::ProfileUpdate => &self.profile_update,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Failed mutations kept before the oldest are evicted.
    pub max_failed: usize,
    /// Request-level retries per replay attempt.
    pub replay_retries: u32,
    pub routes: Routes,
}

impl Default for QueueConfig {
    fn default() -> Self {
        QueueConfig { max_failed: 100, replay_retries: 2, routes: Routes::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Completed { id: String, kind: MutationKind },
    Deferred { id: String, kind: MutationKind, reason: String },
    Failed { id: String, kind: MutationKind, reason: String },
    Evicted { id: String },
}

impl SyncEvent {
    /// The classified error for a failed mutation.
    pub fn error(&self) -> Option<Error> {
        match self {
            SyncEvent::Failed { id, reason, .. } => {
                Some(Error::QueueItemFailed { id: id.clone(), reason: reason.clone() })
            }
            _ => None,
        }
    }
}

/// Outcome counts for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub delivered: usize,
    pub deferred: usize,
    pub failed: usize,
    /// Pending mutations not attempted: blocked behind a deferred mutation of
    /// the same kind, or left when the pass ended early.
    pub skipped: usize,
}

impl SyncReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.deferred + self.failed
    }
}

/// Result of the immediate-send path.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Delivered { id: String, response: Arc<Value> },
    Queued { id: String },
}

impl Submission {
    pub fn id(&self) -> &str {
        match self {
            Submission::Delivered { id, .. } | Submission::Queued { id } => id,
        }
    }
}

pub struct SyncCoordinator<K: KvStore = SqliteKv> {
    store: Mutex<MutationStore<K>>,
    client: Arc<RequestClient>,
    connectivity: Arc<ConnectivityMonitor>,
    clock: Arc<dyn ClockSource>,
    config: QueueConfig,
    pass: AsyncMutex<()>,
    listeners: Mutex<Vec<mpsc::UnboundedSender<SyncEvent>>>,
}

impl<K: KvStore> SyncCoordinator<K> {
    pub fn new(
        store: MutationStore<K>,
        client: Arc<RequestClient>,
        connectivity: Arc<ConnectivityMonitor>,
        config: QueueConfig,
    ) -> Self {
        Self::with_clock(store, client, connectivity, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: MutationStore<K>,
        client: Arc<RequestClient>,
        connectivity: Arc<ConnectivityMonitor>,
        config: QueueConfig,
        clock: Arc<dyn ClockSource>,
    ) -> Self {
        SyncCoordinator {
            store: Mutex::new(store),
            client,
            connectivity,
            clock,
            config,
            pass: AsyncMutex::new(()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Persists a new pending mutation and returns its id.
    pub fn enqueue(&self, kind: MutationKind, payload: Value) -> Result<String> {
        let mutation = QueuedMutation::new(kind, payload, self.clock.now());
        self.persist(mutation)
    }

    /// Sends now when online and nothing of the same kind is still queued;
    /// otherwise, or on a transient failure, the mutation is queued under the
    /// same id. Terminal failures are returned.
    ///
    /// Holds the pass lock, so a direct send never overtakes a replay.
    pub async fn submit(&self, kind: MutationKind, payload: Value) -> Result<Submission> {
        let _pass = self.pass.lock().await;
        let mutation = QueuedMutation::new(kind, payload, self.clock.now());
        if !self.connectivity.is_online() {
            let id = self.persist(mutation)?;
            return Ok(Submission::Queued { id });
        }
        let queued_ahead = self.store().list(kind)?.iter().filter(|m| !m.is_failed()).count();
        if queued_ahead > 0 {
            tracing::debug!(kind = %kind.as_str(), queued_ahead, "queueing behind earlier mutations");
            let id = self.persist(mutation)?;
            return Ok(Submission::Queued { id });
        }

        match self.deliver(&mutation, 0).await {
            Ok(response) => {
                tracing::info!(id = %mutation.id, kind = %kind.as_str(), "mutation delivered");
                Ok(Submission::Delivered { id: mutation.id, response })
            }
            Err(err) if err.is_retryable() => {
                tracing::info!(id = %mutation.id, "immediate send failed, queueing: {}", err);
                let mut mutation = mutation;
                mutation.defer(err.to_string());
                let id = self.persist(mutation)?;
                Ok(Submission::Queued { id })
            }
            Err(err) => Err(err),
        }
    }

    /// Replays pending mutations if online.
    pub async fn trigger_sync(&self) -> Result<SyncReport> {
        if !self.connectivity.is_online() {
            tracing::debug!("sync skipped while offline");
            let skipped = self.store().with_status(MutationStatus::Pending)?.len();
            return Ok(SyncReport { skipped, ..SyncReport::default() });
        }
        self.run_pass().await
    }

    /// Moves every failed mutation back to pending, then syncs.
    pub async fn retry_failed_sync(&self) -> Result<SyncReport> {
        {
            let mut store = self.store();
            for mut mutation in store.with_status(MutationStatus::Failed)? {
                mutation.reset_to_pending();
                store.update(&mutation)?;
            }
        }
        self.trigger_sync().await
    }

    /// Pending and in-flight mutations across all kinds, in creation order.
    pub fn pending_transactions(&self) -> Result<Vec<QueuedMutation>> {
        let all = self.store().all()?;
        Ok(all.into_iter().filter(|m| !m.is_failed()).collect())
    }

    pub fn failed_transactions(&self) -> Result<Vec<QueuedMutation>> {
        Ok(self.store().with_status(MutationStatus::Failed)?)
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<SyncEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.listeners).push(tx);
        rx
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Runs a pass on every offline -> online transition until cancelled.
    pub fn spawn_auto_sync(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()>
    where
        K: 'static,
    {
        let coordinator = Arc::clone(self);
        let (mut previous, mut transitions) = self.connectivity.subscribe_priority();
        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = transitions.recv() => next,
                };
                let Some(state) = next else { break };
                let came_online = state.came_online_from(&previous);
                previous = state;
                if !came_online {
                    continue;
                }
                tracing::info!("connectivity restored, replaying offline queue");
                match coordinator.run_pass().await {
                    Ok(report) => tracing::info!(?report, "automatic sync finished"),
                    Err(e) => tracing::warn!("automatic sync failed: {}", e),
                }
            }
            tracing::debug!("auto-sync stopped");
        })
    }

    async fn run_pass(&self) -> Result<SyncReport> {
        let _pass = self.pass.lock().await;
        let pending = self.store().with_status(MutationStatus::Pending)?;
        let total = pending.len();
        let mut report = SyncReport::default();
        let mut blocked: HashSet<MutationKind> = HashSet::new();

        tracing::debug!(pending = total, "sync pass started");
        for mut mutation in pending {
            if blocked.contains(&mutation.kind) {
                continue;
            }
            mutation.mark_in_flight();
            self.store().update(&mutation)?;

            let outcome = self.deliver(&mutation, self.config.replay_retries).await;
            let in_flight = mutation.clone();
            let settled = match self.settle(&mut mutation, outcome) {
                Ok(settled) => settled,
                Err(e) => {
                    self.release(in_flight);
                    return Err(e);
                }
            };

            match settled {
                Settled::Delivered => {
                    report.delivered += 1;
                    tracing::info!(id = %mutation.id, kind = %mutation.kind.as_str(), "mutation replayed");
                    self.emit(SyncEvent::Completed { id: mutation.id, kind: mutation.kind });
                }
                Settled::Deferred { err } => {
                    report.deferred += 1;
                    self.emit(SyncEvent::Deferred {
                        id: mutation.id.clone(),
                        kind: mutation.kind,
                        reason: err.to_string(),
                    });
                    if ends_pass(&err) {
                        tracing::warn!(id = %mutation.id, "sync pass halted: {}", err);
                        break;
                    }
                    blocked.insert(mutation.kind);
                    tracing::warn!(id = %mutation.id, attempts = mutation.attempts, "mutation deferred: {}", err);
                }
                Settled::Failed { err } => {
                    report.failed += 1;
                    tracing::warn!(id = %mutation.id, "mutation failed permanently: {}", err);
                    self.emit(SyncEvent::Failed {
                        id: mutation.id.clone(),
                        kind: mutation.kind,
                        reason: err.to_string(),
                    });
                    self.enforce_failed_cap()?;
                }
            }
        }

        report.skipped = total - report.attempted();
        tracing::debug!(?report, "sync pass finished");
        Ok(report)
    }

    async fn deliver(&self, mutation: &QueuedMutation, retries: u32) -> Result<Arc<Value>> {
        let route = self.config.routes.route_for(mutation.kind);
        let options = RequestOptions::new()
            .body(mutation.payload.clone())
            .idempotency_key(mutation.id.clone())
            .retries(retries);
        self.client.request(route.method, &route.path, options).await
    }

    fn persist(&self, mutation: QueuedMutation) -> Result<String> {
        let stored = self.store().insert(mutation)?;
        tracing::info!(id = %stored.id, kind = %stored.kind.as_str(), "mutation queued");
        Ok(stored.id)
    }

    /// Persists the outcome of one delivery attempt.
    fn settle(&self, mutation: &mut QueuedMutation, outcome: Result<Arc<Value>>) -> Result<Settled> {
        match outcome {
            Ok(_) => {
                self.store().remove(mutation.kind, &mutation.id)?;
                Ok(Settled::Delivered)
            }
            Err(err) if ends_pass(&err) || err.is_retryable() => {
                mutation.defer(err.to_string());
                self.store().update(mutation)?;
                Ok(Settled::Deferred { err })
            }
            Err(err) => {
                mutation.fail(err.to_string());
                self.store().update(mutation)?;
                Ok(Settled::Failed { err })
            }
        }
    }

    /// Puts an in-flight mutation back to pending after its outcome could
    /// not be recorded, so the next pass sends it again under the same key.
    fn release(&self, mut mutation: QueuedMutation) {
        mutation.reset_to_pending();
        if let Err(e) = self.store().update(&mutation) {
            tracing::error!(id = %mutation.id, "could not release in-flight mutation: {}", e);
        }
    }

    fn enforce_failed_cap(&self) -> Result<()> {
        let evicted = self.store().evict_failed_over(self.config.max_failed)?;
        for id in evicted {
            tracing::warn!(id = %id, max_failed = self.config.max_failed, "evicted failed mutation");
            self.emit(SyncEvent::Evicted { id });
        }
        Ok(())
    }

    fn emit(&self, event: SyncEvent) {
        lock(&self.listeners).retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn store(&self) -> MutexGuard<'_, MutationStore<K>> {
        lock(&self.store)
    }
}

/// What a delivery attempt left in the store.
enum Settled {
    Delivered,
    Deferred { err: Error },
    Failed { err: Error },
}

/// Failures no mutation can get past this pass.
fn ends_pass(err: &Error) -> bool {
    matches!(err, Error::NetworkUnavailable | Error::Unauthenticated)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
