// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queued mutation types.
//!
//! A [`QueuedMutation`] is a money-moving or profile-changing intent that has
//! not yet been acknowledged by the server. Its `id` doubles as the
//! idempotency key sent with every delivery attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// The category of a queued mutation.
///
/// Each kind is its own ordering partition and its own store collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Money transfer (send-money, merchant sale).
    Transaction,
    /// Change to the user's profile.
    ProfileUpdate,
}

impl MutationKind {
    /// Every kind, in a stable order.
    pub const ALL: [MutationKind; 2] = [MutationKind::Transaction, MutationKind::ProfileUpdate];

    /// Returns the string representation used in logs and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Transaction => "transaction",
            MutationKind::ProfileUpdate => "profile_update",
        }
    }

    /// Returns the name of the store collection holding this kind.
    pub fn collection(&self) -> &'static str {
        match self {
            MutationKind::Transaction => "transactions",
            MutationKind::ProfileUpdate => "profileUpdates",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MutationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "transaction" | "transactions" => Ok(MutationKind::Transaction),
            "profile_update" | "profileupdates" => Ok(MutationKind::ProfileUpdate),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

/// Delivery status of a queued mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationStatus {
    /// Waiting to be delivered.
    Pending,
    /// A delivery attempt is running. Never survives a restart.
    InFlight,
    /// Rejected by the server; needs an explicit retry.
    Failed,
}

impl MutationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationStatus::Pending => "pending",
            MutationStatus::InFlight => "in_flight",
            MutationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MutationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MutationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MutationStatus::Pending),
            "in_flight" | "inflight" => Ok(MutationStatus::InFlight),
            "failed" => Ok(MutationStatus::Failed),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// Generates a fresh, time-ordered mutation id.
pub fn new_mutation_id() -> String {
    Uuid::now_v7().to_string()
}

/// Builds the store key for a mutation: `{collection}/{id}`.
pub fn store_key(kind: MutationKind, id: &str) -> String {
    format!("{}/{}", kind.collection(), id)
}

/// A mutation waiting for server acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedMutation {
    /// Client-generated idempotency key.
    pub id: String,
    pub kind: MutationKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub status: MutationStatus,
    /// Delivery attempts that ended in a failure.
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Store-assigned insertion sequence.
    #[serde(default)]
    pub seq: u64,
}

impl QueuedMutation {
    /// Creates a pending mutation with a fresh id.
    pub fn new(kind: MutationKind, payload: serde_json::Value, created_at: DateTime<Utc>) -> Self {
        Self::with_id(new_mutation_id(), kind, payload, created_at)
    }

    /// Creates a pending mutation that reuses an existing id.
    ///
    /// Used when an immediate send failed transiently and the same intent
    /// must be queued under the id the server may already have seen.
    pub fn with_id(
        id: String,
        kind: MutationKind,
        payload: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        QueuedMutation {
            id,
            kind,
            payload,
            created_at,
            status: MutationStatus::Pending,
            attempts: 0,
            last_error: None,
            seq: 0,
        }
    }

    pub fn store_key(&self) -> String {
        store_key(self.kind, &self.id)
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    pub fn is_failed(&self) -> bool {
        self.status == MutationStatus::Failed
    }

    /// Pending -> InFlight.
    pub fn mark_in_flight(&mut self) {
        self.status = MutationStatus::InFlight;
    }

    /// InFlight -> Pending after a retryable failure.
    pub fn defer(&mut self, error: impl Into<String>) {
        self.status = MutationStatus::Pending;
        self.attempts = self.attempts.saturating_add(1);
        self.last_error = Some(error.into());
    }

    /// InFlight -> Failed after a terminal failure.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = MutationStatus::Failed;
        self.attempts = self.attempts.saturating_add(1);
        self.last_error = Some(error.into());
    }

    /// Any status -> Pending, keeping the attempt history.
    pub fn reset_to_pending(&mut self) {
        self.status = MutationStatus::Pending;
    }

    /// Orders mutations by creation: store sequence first, then timestamp.
    pub fn creation_order(a: &QueuedMutation, b: &QueuedMutation) -> std::cmp::Ordering {
        a.seq
            .cmp(&b.seq)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }
}

#[cfg(test)]
#[path = "mutation_tests.rs"]
mod tests;
