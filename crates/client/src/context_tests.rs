// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::error::Error;
use crate::realtime::ChannelState;
use crate::request::{Method, RequestOptions, IDEMPOTENCY_HEADER};
use crate::sync::{Submission, SyncEvent};
use crate::test_helpers::{MockBackend, MockHandle, MockTransport};
use lajan_core::{message_type, MemoryKv, MutationKind, RealtimeMessage};
use serde_json::json;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(2);

struct Fixture {
    ctx: Context<MemoryKv, MockTransport>,
    backend: MockBackend,
    handle: MockHandle,
}

fn fixture() -> Fixture {
    let backend = MockBackend::new();
    let (transport, handle) = MockTransport::new();
    let mut config = Config::default();
    config.request.retry_base_delay_ms = 1;
    config.request.retry_max_delay_ms = 5;
    config.channel.initial_delay_ms = 1;

    let parts = ContextParts {
        store: MutationStore::with_kv(MemoryKv::new()).unwrap(),
        backend: Arc::new(backend.clone()),
        transport,
        connectivity: Arc::new(ConnectivityMonitor::new(true)),
        clock: Arc::new(SystemClock),
    };
    let ctx = Context::assemble(config, parts);
    ctx.set_auth_token(Some(AuthToken::new("test-token")));
    Fixture { ctx, backend, handle }
}

#[tokio::test]
async fn test_offline_transfer_replays_when_connectivity_returns() {
    let f = fixture();
    let mut events = f.ctx.sync().subscribe();
    f.ctx.connectivity().set_online(false);

    let transfer = json!({"recipient": "+50937001122", "amount": 500, "currency": "HTG"});
    let id = match f.ctx.sync().submit(MutationKind::Transaction, transfer).await.unwrap() {
        Submission::Queued { id } => id,
        other => panic!("expected queued, got {other:?}"),
    };
    assert_eq!(f.backend.request_count(), 0);
    let pending = f.ctx.sync().pending_transactions().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, id);

    f.ctx.connectivity().set_online(true);
    let event = tokio::time::timeout(WAIT, events.recv()).await.unwrap().unwrap();
    assert_eq!(event, SyncEvent::Completed { id: id.clone(), kind: MutationKind::Transaction });

    assert!(f.ctx.sync().pending_transactions().unwrap().is_empty());
    let requests = f.backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].path, "/transactions");
    assert_eq!(requests[0].header(IDEMPOTENCY_HEADER), Some(id.as_str()));
    assert_eq!(requests[0].body.as_ref().unwrap()["amount"], 500);
    assert_eq!(requests[0].body.as_ref().unwrap()["currency"], "HTG");

    f.ctx.teardown().await;
}

#[tokio::test]
async fn test_rejected_profile_update_fails_then_retries() {
    let f = fixture();
    f.backend.push_status(422, r#"{"message": "phone number is invalid"}"#);

    let id = f.ctx.sync().enqueue(MutationKind::ProfileUpdate, json!({"phone": "123"})).unwrap();
    let report = f.ctx.sync().trigger_sync().await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.delivered, 0);

    let failed = f.ctx.sync().failed_transactions().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, id);
    assert!(failed[0].last_error.as_deref().unwrap().contains("phone number is invalid"));
    assert!(f.ctx.sync().pending_transactions().unwrap().is_empty());

    // The server now accepts it.
    let report = f.ctx.sync().retry_failed_sync().await.unwrap();
    assert_eq!(report.delivered, 1);
    assert!(f.ctx.sync().failed_transactions().unwrap().is_empty());

    let requests = f.backend.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.method == Method::Patch && r.path == "/profile"));
    assert!(requests.iter().all(|r| r.header(IDEMPOTENCY_HEADER) == Some(id.as_str())));

    f.ctx.teardown().await;
}

#[tokio::test]
async fn test_realtime_message_invalidates_context_cache() {
    let f = fixture();
    let ttl = RequestOptions::new().cache_ttl(Duration::from_secs(120));
    f.ctx.client().request(Method::Get, "/wallet", ttl.clone()).await.unwrap();
    assert_eq!(f.ctx.client().cached_entries(), 1);

    let mut messages = f.ctx.channel().subscribe();
    f.ctx.channel().connect();
    tokio::time::timeout(WAIT, f.ctx.channel().wait_for_state(ChannelState::Connected))
        .await
        .unwrap();
    assert_eq!(f.handle.tokens(), vec![Some("test-token".to_string())]);

    f.handle.push(RealtimeMessage::new(message_type::BALANCE_UPDATED, json!({"balance": 0})));
    tokio::time::timeout(WAIT, messages.recv()).await.unwrap().unwrap();
    assert_eq!(f.ctx.client().cached_entries(), 0);

    f.ctx.teardown().await;
}

#[tokio::test]
async fn test_teardown_stops_channel() {
    let f = fixture();
    f.ctx.channel().connect();
    tokio::time::timeout(WAIT, f.ctx.channel().wait_for_state(ChannelState::Connected))
        .await
        .unwrap();
    let handle = f.handle.clone();

    tokio::time::timeout(WAIT, f.ctx.teardown()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handle.connect_calls(), 1);
}

#[tokio::test]
async fn test_init_persists_queue_across_contexts() {
    let dir = TempDir::new().unwrap();
    let config = Config::default();

    let ctx = Context::init(config.clone(), dir.path()).unwrap();
    ctx.connectivity().set_online(false);
    let id = ctx.sync().enqueue(MutationKind::Transaction, json!({"amount": 500})).unwrap();
    ctx.teardown().await;
    assert!(dir.path().join(QUEUE_DB_NAME).exists());

    let ctx = Context::init(config, dir.path()).unwrap();
    let pending = ctx.sync().pending_transactions().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, id);
    ctx.teardown().await;
}

#[tokio::test]
async fn test_init_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config = Config { realtime_url: "http://example.ht".into(), ..Config::default() };
    let err = Context::init(config, dir.path()).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
}
