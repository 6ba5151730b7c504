// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline queue and replay.
//!
//! ```text
//! enqueue()/submit() ──► MutationStore (durable) ──► SyncCoordinator pass
//!                                                        │
//!                      offline -> online (priority) ─────┤
//!                                                        ▼
//!                                                  RequestClient
//! ```

mod coordinator;

pub use coordinator::{
    QueueConfig, Route, Routes, Submission, SyncCoordinator, SyncEvent, SyncReport,
};
