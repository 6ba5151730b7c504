// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Realtime channel messages.
//!
//! The server pushes JSON objects of the shape `{type, data, timestamp, id?}`.
//! Timestamps arrive either as RFC 3339 strings or as Unix milliseconds.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Message type names recognized by the client.
pub mod message_type {
    pub const BALANCE_UPDATED: &str = "balance_updated";
    pub const TRANSACTION_CREATED: &str = "transaction_created";
    pub const TRANSACTION_STATUS_CHANGED: &str = "transaction_status_changed";
    pub const NOTIFICATION: &str = "notification";
    /// Suffix shared by role-specific aggregate events
    /// (`merchant_aggregate_updated`, `agent_aggregate_updated`, ...).
    pub const AGGREGATE_UPDATED_SUFFIX: &str = "_aggregate_updated";
}

/// Logical stream a message belongs to. The channel keeps the latest
/// message per stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    Balance,
    Transaction,
    Notification,
    Aggregate,
    Other,
}

/// A message received from (or sent over) the realtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default = "Utc::now", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl RealtimeMessage {
    /// Creates a message stamped with the current time.
    pub fn new(kind: impl Into<String>, data: serde_json::Value) -> Self {
        RealtimeMessage { kind: kind.into(), data, timestamp: Utc::now(), id: None }
    }

    /// Returns the stream this message type belongs to.
    pub fn stream(&self) -> Stream {
        match self.kind.as_str() {
            message_type::BALANCE_UPDATED => Stream::Balance,
            message_type::TRANSACTION_CREATED | message_type::TRANSACTION_STATUS_CHANGED => {
                Stream::Transaction
            }
            message_type::NOTIFICATION => Stream::Notification,
            k if k.ends_with(message_type::AGGREGATE_UPDATED_SUFFIX) => Stream::Aggregate,
            _ => Stream::Other,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::Text(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| D::Error::custom(format!("invalid timestamp '{s}'"))),
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
