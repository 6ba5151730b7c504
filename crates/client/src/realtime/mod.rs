// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime push channel.
//!
//! ```text
//! ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ChannelManager│────►│  Transport  │────►│  Realtime   │
//! │  (task)      │◄────│   (trait)   │◄────│  endpoint   │
//! └──────────────┘     └─────────────┘     └─────────────┘
//!        │ invalidate
//!        ▼
//! ┌──────────────┐
//! │RequestClient │  (response cache)
//! └──────────────┘
//! ```

mod channel;
mod invalidation;
mod transport;

pub use channel::{ChannelConfig, ChannelEvent, ChannelManager, ChannelState, ChannelStatus};
pub use invalidation::InvalidationMap;
pub use transport::{
    Transport, TransportError, TransportFuture, TransportResult, WebSocketTransport,
};
