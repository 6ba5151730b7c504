// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Classified failures surfaced to callers.
//!
//! Every failure that leaves the request client, the realtime channel or the
//! offline queue is one of these variants. Transient variants are the only
//! ones the retry and replay paths will try again.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The device is offline; no network call was made.
    #[error("network unavailable")]
    NetworkUnavailable,

    #[error("request timed out")]
    Timeout,

    #[error("server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("rate limited{}", retry_after.map(|d| format!(" (retry after {}s)", d.as_secs())).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    /// Credentials are missing, expired or were rejected by the server.
    #[error("not authenticated")]
    Unauthenticated,

    #[error("request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    #[error("realtime channel not connected")]
    ChannelNotConnected,

    #[error("queued mutation {id} failed: {reason}")]
    QueueItemFailed { id: String, reason: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("interceptor rejected request: {0}")]
    Interceptor(String),

    #[error("store error: {0}")]
    Store(#[from] lajan_core::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for failures that may succeed if the same call is made again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::NetworkUnavailable
                | Error::Timeout
                | Error::ServerError { .. }
                | Error::RateLimited { .. }
        )
    }

    /// Server-provided wait hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Short classification name used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NetworkUnavailable => "network_unavailable",
            Error::Timeout => "timeout",
            Error::ServerError { .. } => "server_error",
            Error::RateLimited { .. } => "rate_limited",
            Error::Unauthenticated => "unauthenticated",
            Error::Validation { .. } => "validation",
            Error::ChannelNotConnected => "channel_not_connected",
            Error::QueueItemFailed { .. } => "queue_item_failed",
            Error::InvalidResponse(_) => "invalid_response",
            Error::Interceptor(_) => "interceptor",
            Error::Store(_) => "store",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
