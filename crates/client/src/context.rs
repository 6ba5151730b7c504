// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The client context: one owned object holding every subsystem.
//!
//! ```text
//!   Context::init(config, state_dir)
//!        │
//!        ├── ConnectivityMonitor ──────────────┐
//!        ├── RequestClient (ReqwestBackend) ◄──┤
//!        ├── ChannelManager (WebSocket) ◄──────┤
//!        └── SyncCoordinator (queue.db) ◄──────┘
//!                 └── auto-sync task
//! ```
//!
//! Nothing here is global. Dropping a context without [`Context::teardown`]
//! cancels its background tasks but does not wait for them.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lajan_core::{ClockSource, KvStore, MutationStore, SqliteKv, SystemClock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, QUEUE_DB_NAME};
use crate::connectivity::ConnectivityMonitor;
use crate::error::Result;
use crate::realtime::{ChannelManager, Transport, WebSocketTransport};
use crate::request::{AuthToken, HttpBackend, ReqwestBackend, RequestClient};
use crate::sync::SyncCoordinator;

/// Pre-built pieces for [`Context::assemble`].
pub struct ContextParts<K: KvStore, T: Transport> {
    pub store: MutationStore<K>,
    pub backend: Arc<dyn HttpBackend>,
    pub transport: T,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub clock: Arc<dyn ClockSource>,
}

pub struct Context<K: KvStore = SqliteKv, T: Transport = WebSocketTransport> {
    config: Config,
    connectivity: Arc<ConnectivityMonitor>,
    client: Arc<RequestClient>,
    channel: ChannelManager<T>,
    sync: Arc<SyncCoordinator<K>>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Context {
    /// Opens `<state_dir>/queue.db` and wires the production backends.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn init(config: Config, state_dir: &Path) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(state_dir)?;
        let store = MutationStore::open(&state_dir.join(QUEUE_DB_NAME))?;
        let backend = ReqwestBackend::new(&config.api_base_url)?;
        let parts = ContextParts {
            store,
            backend: Arc::new(backend),
            transport: WebSocketTransport::new(),
            connectivity: Arc::new(ConnectivityMonitor::new(true)),
            clock: Arc::new(SystemClock),
        };
        tracing::info!(state_dir = %state_dir.display(), "client context initialized");
        Ok(Self::assemble(config, parts))
    }
}

impl<K: KvStore + 'static, T: Transport> Context<K, T> {
    /// Builds a context from caller-supplied parts and starts auto-sync.
    pub fn assemble(config: Config, parts: ContextParts<K, T>) -> Self {
        let ContextParts { store, backend, transport, connectivity, clock } = parts;
        let client = Arc::new(RequestClient::with_clock(
            backend,
            connectivity.clone(),
            config.request_config(),
            clock.clone(),
        ));
        let channel = ChannelManager::new(
            config.channel_config(),
            transport,
            client.clone(),
            connectivity.clone(),
        );
        let sync = Arc::new(SyncCoordinator::with_clock(
            store,
            client.clone(),
            connectivity.clone(),
            config.queue_config(),
            clock,
        ));

        let cancel = CancellationToken::new();
        let tasks = vec![sync.spawn_auto_sync(cancel.child_token())];
        Context { config, connectivity, client, channel, sync, cancel, tasks }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn client(&self) -> &Arc<RequestClient> {
        &self.client
    }

    pub fn channel(&self) -> &ChannelManager<T> {
        &self.channel
    }

    pub fn sync(&self) -> &Arc<SyncCoordinator<K>> {
        &self.sync
    }

    pub fn set_auth_token(&self, token: Option<AuthToken>) {
        self.client.set_auth_token(token);
    }

    /// Starts probing the API base URL every `interval` to drive the
    /// connectivity monitor.
    pub fn start_probe(&mut self, interval: Duration) {
        let handle = self.connectivity.spawn_probe(
            reqwest::Client::new(),
            self.config.api_base_url.clone(),
            interval,
            self.cancel.child_token(),
        );
        self.tasks.push(handle);
    }

    /// Stops the channel and every background task, waiting for each.
    pub async fn teardown(mut self) {
        self.channel.disconnect().await;
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!("background task ended abnormally: {}", e);
            }
        }
        tracing::info!("client context torn down");
    }
}

impl<K: KvStore, T: Transport> Drop for Context<K, T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
