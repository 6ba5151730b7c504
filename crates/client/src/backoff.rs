// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential backoff shared by request retries and channel reconnects.

use std::time::Duration;

/// Delay before retry number `attempt` (zero-based): `base * 2^attempt`,
/// capped at `max`.
pub fn backoff_delay(base: Duration, attempt: u32, max: Duration) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.checked_mul(factor).unwrap_or(max).min(max)
}

/// Retry schedule for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        RetryPolicy { base_delay, max_delay }
    }

    /// Delay before retry `attempt`. A server hint such as `Retry-After`
    /// replaces the computed delay but is still capped.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        match hint {
            Some(hint) => hint.min(self.max_delay),
            None => backoff_delay(self.base_delay, attempt, self.max_delay),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { base_delay: Duration::from_millis(250), max_delay: Duration::from_secs(8) }
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
