// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Maps raw HTTP outcomes onto the error taxonomy.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::backend::{HttpResponse, TransportFailure};
use crate::error::Error;

/// Classifies a response. Returns `None` for 2xx.
pub fn classify_response(response: &HttpResponse, now: DateTime<Utc>) -> Option<Error> {
    let status = response.status;
    match status {
        200..=299 => None,
        401 => Some(Error::Unauthenticated),
        429 => Some(Error::RateLimited {
            retry_after: response.header("retry-after").and_then(|v| parse_retry_after(v, now)),
        }),
        400..=499 => Some(Error::Validation { status, message: extract_message(&response.body) }),
        500..=599 => Some(Error::ServerError { status, message: extract_message(&response.body) }),
        _ => Some(Error::InvalidResponse(format!("unexpected status {status}"))),
    }
}

/// Failures below HTTP are transient. Only a refused connection counts as
/// being offline; a connection that broke mid-exchange is a server fault
/// with no status (`0`), so it is retried without ending a sync pass.
pub fn classify_transport(failure: &TransportFailure) -> Error {
    match failure {
        TransportFailure::Timeout => Error::Timeout,
        TransportFailure::Connect(_) => Error::NetworkUnavailable,
        TransportFailure::Other(message) => {
            Error::ServerError { status: 0, message: message.clone() }
        }
    }
}

/// Parses `Retry-After` as delta-seconds or an HTTP date.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

/// Pulls a human-readable message out of an error body.
///
/// Accepts `{"message": ..}`, `{"error": ".."}` and `{"error": {"message": ..}}`;
/// anything else falls back to the raw body text.
pub fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let found = value
            .get("message")
            .and_then(|m| m.as_str())
            .or_else(|| value.get("error").and_then(|e| e.as_str()))
            .or_else(|| value.pointer("/error/message").and_then(|m| m.as_str()));
        if let Some(message) = found {
            return message.to_string();
        }
    }
    let body = body.trim();
    if body.is_empty() {
        "no details".to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
