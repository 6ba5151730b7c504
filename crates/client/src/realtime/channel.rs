// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime channel manager.
//!
//! Owns one long-lived connection to the realtime endpoint. A background task
//! connects, pumps messages in both directions and reconnects with
//! exponential backoff. Each received message invalidates the cache prefixes
//! mapped to its type before any subscriber sees it.
//!
//! State machine:
//!
//! ```text
//! Disconnected ─connect()─► Connecting ─ok─► Connected
//!      ▲                        │               │
//!      └──── backoff ◄── fail ──┘◄──── lost ────┘
//!      │
//!      └─ attempts exhausted ─► Error        any ─disconnect()─► Stopped
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use lajan_core::{RealtimeMessage, Stream};
use tokio::sync::{mpsc, oneshot, watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::invalidation::InvalidationMap;
use super::transport::{Transport, TransportError, WebSocketTransport};
use crate::backoff::backoff_delay;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{Error, Result};
use crate::request::RequestClient;

/// Capacity of the per-connection outbound queue.
const OUTGOING_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub url: String,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Consecutive failed attempts before giving up. Zero retries forever.
    pub max_retries: u32,
    pub invalidation: InvalidationMap,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            url: "ws://localhost:8080/realtime".to_string(),
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_retries: 10,
            invalidation: InvalidationMap::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    /// Explicitly disconnected; only `connect()` leaves this state.
    Stopped,
    /// Reconnect attempts exhausted.
    Error,
}

impl ChannelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelState::Disconnected => "disconnected",
            ChannelState::Connecting => "connecting",
            ChannelState::Connected => "connected",
            ChannelState::Stopped => "stopped",
            ChannelState::Error => "error",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStatus {
    pub state: ChannelState,
    pub reconnect_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    StateChanged(ChannelState),
    ReconnectScheduled { attempt: u32, delay: Duration },
}

struct Outgoing {
    message: RealtimeMessage,
    ack: oneshot::Sender<Result<()>>,
}

struct Shared {
    config: ChannelConfig,
    client: Arc<RequestClient>,
    connectivity: Arc<ConnectivityMonitor>,
    status: watch::Sender<ChannelStatus>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<RealtimeMessage>>>,
    events: Mutex<Vec<mpsc::UnboundedSender<ChannelEvent>>>,
    last_messages: Mutex<HashMap<Stream, RealtimeMessage>>,
    outgoing: Mutex<Option<mpsc::Sender<Outgoing>>>,
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct ChannelManager<T: Transport = WebSocketTransport> {
    shared: Arc<Shared>,
    transport: Arc<AsyncMutex<T>>,
    task: Mutex<Option<RunningTask>>,
}

impl<T: Transport> ChannelManager<T> {
    pub fn new(
        config: ChannelConfig,
        transport: T,
        client: Arc<RequestClient>,
        connectivity: Arc<ConnectivityMonitor>,
    ) -> Self {
        let (status, _) = watch::channel(ChannelStatus {
            state: ChannelState::Disconnected,
            reconnect_attempts: 0,
        });
        ChannelManager {
            shared: Arc::new(Shared {
                config,
                client,
                connectivity,
                status,
                subscribers: Mutex::new(Vec::new()),
                events: Mutex::new(Vec::new()),
                last_messages: Mutex::new(HashMap::new()),
                outgoing: Mutex::new(None),
            }),
            transport: Arc::new(AsyncMutex::new(transport)),
            task: Mutex::new(None),
        }
    }

    /// Starts the connection task. No-op while a task is already running.
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        let mut task = lock(&self.task);
        if task.as_ref().is_some_and(|t| !t.handle.is_finished()) {
            tracing::debug!("realtime channel already running");
            return;
        }
        self.shared.status.send_modify(|s| s.reconnect_attempts = 0);
        self.shared.set_state(ChannelState::Connecting);

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(
            Arc::clone(&self.shared),
            Arc::clone(&self.transport),
            cancel.clone(),
        ));
        *task = Some(RunningTask { cancel, handle });
    }

    /// Stops the connection task and closes the transport.
    pub async fn disconnect(&self) {
        let running = lock(&self.task).take();
        if let Some(running) = running {
            running.cancel.cancel();
            if let Err(e) = running.handle.await {
                tracing::warn!("realtime task ended abnormally: {}", e);
            }
        }
        *lock(&self.shared.outgoing) = None;
        self.shared.set_state(ChannelState::Stopped);
    }

    /// Sends a message over the live connection.
    pub async fn send_message(&self, message: RealtimeMessage) -> Result<()> {
        if self.state() != ChannelState::Connected {
            return Err(Error::ChannelNotConnected);
        }
        let sender = lock(&self.shared.outgoing).clone().ok_or(Error::ChannelNotConnected)?;
        let (ack, done) = oneshot::channel();
        sender
            .send(Outgoing { message, ack })
            .await
            .map_err(|_| Error::ChannelNotConnected)?;
        done.await.map_err(|_| Error::ChannelNotConnected)?
    }

    /// Receives every message delivered after this call.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<RealtimeMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.shared.subscribers).push(tx);
        rx
    }

    pub fn subscribe_events(&self) -> mpsc::UnboundedReceiver<ChannelEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.shared.events).push(tx);
        rx
    }

    pub fn status(&self) -> ChannelStatus {
        *self.shared.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ChannelStatus> {
        self.shared.status.subscribe()
    }

    pub fn state(&self) -> ChannelState {
        self.status().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ChannelState::Connected
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.status().reconnect_attempts
    }

    /// Human-readable status for display.
    pub fn connection_status(&self) -> &'static str {
        self.state().as_str()
    }

    /// Most recent message received on `stream`.
    pub fn last_message(&self, stream: Stream) -> Option<RealtimeMessage> {
        lock(&self.shared.last_messages).get(&stream).cloned()
    }

    /// Resolves once the channel reaches `state`.
    pub async fn wait_for_state(&self, state: ChannelState) {
        let mut rx = self.shared.status.subscribe();
        let _ = rx.wait_for(|s| s.state == state).await;
    }
}

impl Shared {
    fn set_state(&self, state: ChannelState) {
        let changed = self.status.send_if_modified(|s| {
            if s.state == state {
                return false;
            }
            s.state = state;
            true
        });
        if changed {
            tracing::debug!(state = %state, "realtime channel state changed");
            self.emit(ChannelEvent::StateChanged(state));
        }
    }

    fn emit(&self, event: ChannelEvent) {
        lock(&self.events).retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Invalidate, record, then fan out.
    fn dispatch(&self, message: RealtimeMessage) {
        for prefix in self.config.invalidation.prefixes_for(&message.kind) {
            self.client.invalidate_cache(prefix);
        }
        lock(&self.last_messages).insert(message.stream(), message.clone());
        lock(&self.subscribers).retain(|tx| tx.send(message.clone()).is_ok());
    }
}

enum PumpEnd {
    Cancelled,
    Closed,
    Offline,
    Lost(TransportError),
}

enum Step {
    Cancelled,
    Offline,
    Send(Outgoing),
    Received(std::result::Result<Option<RealtimeMessage>, TransportError>),
}

async fn run<T: Transport>(
    shared: Arc<Shared>,
    transport: Arc<AsyncMutex<T>>,
    cancel: CancellationToken,
) {
    let mut transport = transport.lock().await;
    let config = &shared.config;

    loop {
        if !shared.connectivity.is_online() {
            shared.set_state(ChannelState::Disconnected);
            tracing::debug!("realtime channel waiting for connectivity");
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = shared.connectivity.wait_online() => {}
            }
        }

        shared.set_state(ChannelState::Connecting);
        let token = shared.client.bearer_token();
        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = transport.connect(&config.url, token.as_deref()) => result,
        };

        match connected {
            Ok(()) => {
                shared.status.send_modify(|s| s.reconnect_attempts = 0);
                shared.set_state(ChannelState::Connected);
                tracing::info!(url = %config.url, "realtime channel connected");

                let (tx, rx) = mpsc::channel(OUTGOING_CAPACITY);
                *lock(&shared.outgoing) = Some(tx);
                let ended = pump(&shared, &mut *transport, rx, &cancel).await;
                *lock(&shared.outgoing) = None;

                match ended {
                    PumpEnd::Cancelled => break,
                    PumpEnd::Offline => {
                        tracing::info!("realtime channel paused while offline");
                        let _ = transport.disconnect().await;
                        shared.set_state(ChannelState::Disconnected);
                        continue;
                    }
                    PumpEnd::Closed => tracing::warn!("realtime connection closed by server"),
                    PumpEnd::Lost(e) => tracing::warn!("realtime connection lost: {}", e),
                }
            }
            Err(e) => tracing::warn!("realtime connect failed: {}", e),
        }

        shared.set_state(ChannelState::Disconnected);

        let attempts = shared.status.borrow().reconnect_attempts;
        if config.max_retries > 0 && attempts >= config.max_retries {
            tracing::error!(attempts, "realtime reconnect attempts exhausted");
            let _ = transport.disconnect().await;
            shared.set_state(ChannelState::Error);
            return;
        }

        let delay = backoff_delay(config.initial_delay, attempts, config.max_delay);
        let attempt = attempts + 1;
        shared.status.send_modify(|s| s.reconnect_attempts = attempt);
        shared.emit(ChannelEvent::ReconnectScheduled { attempt, delay });
        tracing::info!(attempt, ?delay, "realtime reconnect scheduled");

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    let _ = transport.disconnect().await;
    shared.set_state(ChannelState::Stopped);
}

async fn pump<T: Transport>(
    shared: &Shared,
    transport: &mut T,
    mut outgoing: mpsc::Receiver<Outgoing>,
    cancel: &CancellationToken,
) -> PumpEnd {
    loop {
        let step = tokio::select! {
            biased;
            _ = cancel.cancelled() => Step::Cancelled,
            _ = shared.connectivity.wait_offline() => Step::Offline,
            Some(out) = outgoing.recv() => Step::Send(out),
            received = transport.recv() => Step::Received(received),
        };

        match step {
            Step::Cancelled => return PumpEnd::Cancelled,
            Step::Offline => return PumpEnd::Offline,
            Step::Send(Outgoing { message, ack }) => {
                let result = transport.send(message).await;
                let lost = matches!(
                    result,
                    Err(TransportError::SendFailed(_)) | Err(TransportError::ConnectionClosed)
                );
                let _ = ack.send(result.map_err(|e| {
                    tracing::warn!("realtime send failed: {}", e);
                    Error::ChannelNotConnected
                }));
                if lost {
                    return PumpEnd::Lost(TransportError::ConnectionClosed);
                }
            }
            Step::Received(Ok(Some(message))) => shared.dispatch(message),
            Step::Received(Ok(None)) => return PumpEnd::Closed,
            Step::Received(Err(TransportError::SerializationError(e))) => {
                tracing::warn!("dropping malformed realtime message: {}", e);
            }
            Step::Received(Err(e)) => return PumpEnd::Lost(e),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
