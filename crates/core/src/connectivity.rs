// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide connectivity snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse connection-quality signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionQuality {
    #[default]
    Unknown,
    Slow,
    Normal,
}

impl fmt::Display for ConnectionQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionQuality::Unknown => "unknown",
            ConnectionQuality::Slow => "slow",
            ConnectionQuality::Normal => "normal",
        };
        write!(f, "{s}")
    }
}

/// Online/offline state as last reported by the connectivity monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityState {
    pub online: bool,
    pub quality: ConnectionQuality,
    pub last_changed_at: DateTime<Utc>,
}

impl ConnectivityState {
    pub fn new(online: bool, last_changed_at: DateTime<Utc>) -> Self {
        ConnectivityState { online, quality: ConnectionQuality::Unknown, last_changed_at }
    }

    /// True when this state is an offline -> online transition from `previous`.
    pub fn came_online_from(&self, previous: &ConnectivityState) -> bool {
        self.online && !previous.online
    }
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
