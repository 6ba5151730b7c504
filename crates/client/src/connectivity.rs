// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitor.
//!
//! Holds the process-wide online/offline state. Platform signals (or the
//! reachability probe below) feed it through [`ConnectivityMonitor::set_online`];
//! everything else reads it or subscribes to transitions.
//!
//! Subscribers come in two tiers. Priority subscribers (the offline queue)
//! receive each transition before the shared `watch` value is updated, so a
//! display-only subscriber never observes "online" ahead of the queue.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lajan_core::{ClockSource, ConnectionQuality, ConnectivityState, SystemClock};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Latency above which a successful probe reports [`ConnectionQuality::Slow`].
pub const SLOW_PROBE_THRESHOLD: Duration = Duration::from_millis(1500);

pub struct ConnectivityMonitor {
    /// Serializes writers; also guards the priority subscriber list so a
    /// subscription and its starting snapshot are taken atomically.
    priority: Mutex<Vec<mpsc::UnboundedSender<ConnectivityState>>>,
    state: watch::Sender<ConnectivityState>,
    clock: Arc<dyn ClockSource>,
}

impl ConnectivityMonitor {
    pub fn new(online: bool) -> Self {
        Self::with_clock(online, Arc::new(SystemClock))
    }

    pub fn with_clock(online: bool, clock: Arc<dyn ClockSource>) -> Self {
        let (state, _) = watch::channel(ConnectivityState::new(online, clock.now()));
        ConnectivityMonitor { priority: Mutex::new(Vec::new()), state, clock }
    }

    pub fn state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.state.borrow().online
    }

    /// Records an online/offline signal. Repeated signals with the same value
    /// are ignored.
    pub fn set_online(&self, online: bool) {
        let mut priority = self.lock_priority();
        let current = *self.state.borrow();
        if current.online == online {
            return;
        }
        let mut next = ConnectivityState::new(online, self.clock.now());
        next.quality = if online { current.quality } else { ConnectionQuality::Unknown };
        tracing::info!(online, "connectivity changed");
        Self::publish(&mut priority, &self.state, next);
    }

    pub fn set_quality(&self, quality: ConnectionQuality) {
        let mut priority = self.lock_priority();
        let current = *self.state.borrow();
        if current.quality == quality {
            return;
        }
        tracing::debug!(%quality, "connection quality changed");
        Self::publish(&mut priority, &self.state, ConnectivityState { quality, ..current });
    }

    /// Subscribes ahead of display subscribers. Returns the state at the
    /// moment of subscription together with the stream of later states.
    pub fn subscribe_priority(
        &self,
    ) -> (ConnectivityState, mpsc::UnboundedReceiver<ConnectivityState>) {
        let mut priority = self.lock_priority();
        let (tx, rx) = mpsc::unbounded_channel();
        priority.push(tx);
        (*self.state.borrow(), rx)
    }

    /// Subscribes for display purposes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.state.subscribe()
    }

    /// Resolves once the monitor reports online.
    pub async fn wait_online(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this only errors on shutdown.
        let _ = rx.wait_for(|s| s.online).await;
    }

    /// Resolves once the monitor reports offline.
    pub async fn wait_offline(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| !s.online).await;
    }

    /// Periodically probes `url` and feeds the result back into the monitor.
    ///
    /// Any HTTP response counts as reachable; quality is derived from latency.
    pub fn spawn_probe(
        self: &Arc<Self>,
        client: reqwest::Client,
        url: String,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                let started = Instant::now();
                let reachable = client.head(&url).send().await.is_ok();
                monitor.set_online(reachable);
                if reachable {
                    monitor.set_quality(quality_for_latency(started.elapsed()));
                }
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            tracing::debug!("connectivity probe stopped");
        })
    }

    fn publish(
        priority: &mut Vec<mpsc::UnboundedSender<ConnectivityState>>,
        state: &watch::Sender<ConnectivityState>,
        next: ConnectivityState,
    ) {
        priority.retain(|tx| tx.send(next).is_ok());
        state.send_replace(next);
    }

    fn lock_priority(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<ConnectivityState>>> {
        self.priority.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Maps probe latency to a coarse quality signal.
pub fn quality_for_latency(latency: Duration) -> ConnectionQuality {
    if latency > SLOW_PROBE_THRESHOLD {
        ConnectionQuality::Slow
    } else {
        ConnectionQuality::Normal
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
