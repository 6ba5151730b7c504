// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! lajan-core: shared data model and durable storage for the lajan client.
//!
//! This crate provides the types exchanged between the request layer, the
//! realtime channel and the offline queue, plus the durable mutation store
//! the queue persists into.

pub mod clock;
pub mod connectivity;
pub mod error;
pub mod kv;
pub mod message;
pub mod mutation;
pub mod store;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use connectivity::{ConnectionQuality, ConnectivityState};
pub use error::{Error, Result};
pub use kv::{KvStore, MemoryKv, SqliteKv};
pub use message::{message_type, RealtimeMessage, Stream};
pub use mutation::{new_mutation_id, MutationKind, MutationStatus, QueuedMutation};
pub use store::MutationStore;
