// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles: a scripted HTTP backend and an in-memory realtime
//! transport.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lajan_core::RealtimeMessage;
use tokio::sync::mpsc;

use crate::backoff::RetryPolicy;
use crate::connectivity::ConnectivityMonitor;
use crate::realtime::{Transport, TransportError, TransportFuture};
use crate::request::{
    AuthToken, BackendFuture, HttpBackend, HttpRequest, HttpResponse, RequestClient,
    RequestConfig, TransportFailure,
};

type Reply = std::result::Result<HttpResponse, TransportFailure>;

/// Backend that replays scripted replies and records every request.
///
/// Replies are matched by path when a per-path script exists, otherwise the
/// shared script is used. When every script is exhausted it answers
/// `200 {}`.
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockBackendInner>>,
}

#[derive(Default)]
struct MockBackendInner {
    script: VecDeque<Reply>,
    by_path: Vec<(String, VecDeque<Reply>)>,
    requests: Vec<HttpRequest>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Reply) -> &Self {
        self.inner.lock().unwrap().script.push_back(reply);
        self
    }

    pub fn push_status(&self, status: u16, body: &str) -> &Self {
        self.push(Ok(HttpResponse::new(status, body)))
    }

    pub fn push_for(&self, path: &str, reply: Reply) -> &Self {
        let mut inner = self.inner.lock().unwrap();
        match inner.by_path.iter_mut().find(|(p, _)| p.as_str() == path) {
            Some((_, queue)) => queue.push_back(reply),
            None => inner.by_path.push((path.to_string(), VecDeque::from([reply]))),
        }
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().unwrap().requests.len()
    }

    pub fn bodies_for(&self, path: &str) -> Vec<serde_json::Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .filter_map(|r| r.body)
            .collect()
    }
}

impl HttpBackend for MockBackend {
    fn execute(&self, request: HttpRequest) -> BackendFuture<'_> {
        let reply = {
            let mut inner = self.inner.lock().unwrap();
            let path = request.path.clone();
            inner.requests.push(request);
            let scripted = inner
                .by_path
                .iter_mut()
                .find(|(p, _)| p.as_str() == path)
                .and_then(|(_, queue)| queue.pop_front());
            scripted
                .or_else(|| inner.script.pop_front())
                .unwrap_or_else(|| Ok(HttpResponse::new(200, "{}")))
        };
        Box::pin(async move { reply })
    }
}

pub fn fast_config() -> RequestConfig {
    RequestConfig {
        timeout: Duration::from_secs(1),
        retry: RetryPolicy::new(Duration::from_millis(1), Duration::from_millis(5)),
        default_retries: 2,
    }
}

/// An online, authenticated client over `backend`.
pub fn client_with(backend: &MockBackend) -> (Arc<RequestClient>, Arc<ConnectivityMonitor>) {
    let connectivity = Arc::new(ConnectivityMonitor::new(true));
    let client = RequestClient::new(Arc::new(backend.clone()), connectivity.clone(), fast_config());
    client.set_auth_token(Some(AuthToken::new("test-token")));
    (Arc::new(client), connectivity)
}

enum Incoming {
    Message(RealtimeMessage),
    Close,
}

/// Transport whose inbound side is fed through a [`MockHandle`].
pub struct MockTransport {
    connected: bool,
    handle: MockHandle,
}

#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
    incoming_tx: mpsc::UnboundedSender<Incoming>,
    incoming_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Incoming>>>,
}

#[derive(Default)]
struct MockState {
    connect_failures: u32,
    connect_calls: u32,
    tokens: Vec<Option<String>>,
    sent: Vec<RealtimeMessage>,
}

impl MockTransport {
    pub fn new() -> (Self, MockHandle) {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let handle = MockHandle {
            state: Arc::new(Mutex::new(MockState::default())),
            incoming_tx,
            incoming_rx: Arc::new(tokio::sync::Mutex::new(incoming_rx)),
        };
        (MockTransport { connected: false, handle: handle.clone() }, handle)
    }
}

impl MockHandle {
    /// The next `n` connect attempts fail.
    pub fn fail_connects(&self, n: u32) {
        self.state.lock().unwrap().connect_failures = n;
    }

    pub fn connect_calls(&self) -> u32 {
        self.state.lock().unwrap().connect_calls
    }

    pub fn tokens(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().tokens.clone()
    }

    pub fn sent(&self) -> Vec<RealtimeMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn push(&self, message: RealtimeMessage) {
        let _ = self.incoming_tx.send(Incoming::Message(message));
    }

    /// Simulates the server dropping the connection.
    pub fn close(&self) {
        let _ = self.incoming_tx.send(Incoming::Close);
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, _url: &str, token: Option<&str>) -> TransportFuture<'_, ()> {
        let token = token.map(str::to_string);
        Box::pin(async move {
            let mut state = self.handle.state.lock().unwrap();
            state.connect_calls += 1;
            state.tokens.push(token);
            if state.connect_failures > 0 {
                state.connect_failures -= 1;
                return Err(TransportError::ConnectionFailed("mock failure".into()));
            }
            drop(state);
            self.connected = true;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.connected = false;
            Ok(())
        })
    }

    fn send(&mut self, message: RealtimeMessage) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            if !self.connected {
                return Err(TransportError::ConnectionClosed);
            }
            self.handle.state.lock().unwrap().sent.push(message);
            Ok(())
        })
    }

    fn recv(&mut self) -> TransportFuture<'_, Option<RealtimeMessage>> {
        let incoming = Arc::clone(&self.handle.incoming_rx);
        Box::pin(async move {
            let next = incoming.lock().await.recv().await;
            match next {
                Some(Incoming::Message(message)) => Ok(Some(message)),
                Some(Incoming::Close) | None => {
                    self.connected = false;
                    Ok(None)
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Polls `check` until it holds or a second passes.
pub async fn eventually<F: FnMut() -> bool>(mut check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
