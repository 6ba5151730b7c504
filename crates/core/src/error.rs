// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lajan-core operations.

use thiserror::Error;

/// All possible errors that can occur in lajan-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("mutation not found: {0}")]
    MutationNotFound(String),

    #[error("invalid mutation kind: '{0}'\n  hint: valid kinds are: transaction, profile_update")]
    InvalidKind(String),

    #[error("invalid mutation status: '{0}'\n  hint: valid statuses are: pending, in_flight, failed")]
    InvalidStatus(String),

    #[error("invalid store key: '{0}'")]
    InvalidKey(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for lajan-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
