// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use lajan_core::KvStore;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::realtime::{ChannelEvent, ChannelState, Transport};

const PROBE_INTERVAL: Duration = Duration::from_secs(15);

/// Streams realtime messages as JSON lines until `count` arrive (0 = no
/// limit) or the process is interrupted. Channel state changes go to stderr.
pub async fn run<K: KvStore + 'static, T: Transport>(ctx: &mut Context<K, T>, count: usize) -> Result<()> {
    if ctx.connectivity().is_online() {
        ctx.start_probe(PROBE_INTERVAL);
    }
    let mut messages = ctx.channel().subscribe();
    let mut events = ctx.channel().subscribe_events();
    ctx.channel().connect();

    let mut seen = 0usize;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
            event = events.recv() => match event {
                Some(ChannelEvent::StateChanged(ChannelState::Error)) => {
                    return Err(Error::ChannelNotConnected);
                }
                Some(ChannelEvent::StateChanged(state)) => eprintln!("channel: {}", state),
                Some(ChannelEvent::ReconnectScheduled { attempt, delay }) => {
                    eprintln!("channel: reconnect #{} in {:?}", attempt, delay);
                }
                None => break,
            },
            message = messages.recv() => {
                let Some(message) = message else { break };
                println!("{}", serde_json::to_string(&message)?);
                seen += 1;
                if count > 0 && seen >= count {
                    break;
                }
            }
        }
    }
    Ok(())
}
