// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration file handling.
//!
//! Configuration lives in `config.toml` under the platform config directory
//! (`~/.config/lajan/config.toml` on Linux). Every field has a default, so a
//! missing or partial file is valid.
//!
//! ```toml
//! api_base_url = "https://api.lajan.ht/v1"
//! realtime_url = "wss://api.lajan.ht/realtime"
//!
//! [request]
//! timeout_ms = 15000
//!
//! [channel]
//! max_retries = 10
//!
//! [queue.routes.transaction]
//! method = "POST"
//! path = "/transactions"
//!
//! [invalidation]
//! balance_updated = ["/wallet", "/balance"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::RetryPolicy;
use crate::error::{Error, Result};
use crate::realtime::{ChannelConfig, InvalidationMap};
use crate::request::RequestConfig;
use crate::sync::{QueueConfig, Routes};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const QUEUE_DB_NAME: &str = "queue.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_realtime_url")]
    pub realtime_url: String,
    #[serde(default)]
    pub request: RequestSettings,
    #[serde(default)]
    pub channel: ChannelSettings,
    #[serde(default)]
    pub queue: QueueSettings,
    #[serde(default)]
    pub invalidation: InvalidationMap,
}

fn default_api_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_realtime_url() -> String {
    "ws://localhost:8080/realtime".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSettings {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_delay_ms: u64,
    #[serde(default = "default_retries")]
    pub default_retries: u32,
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_retry_base_ms() -> u64 {
    250
}

fn default_retry_max_ms() -> u64 {
    8_000
}

fn default_retries() -> u32 {
    2
}

impl Default for RequestSettings {
    fn default() -> Self {
        RequestSettings {
            timeout_ms: default_timeout_ms(),
            retry_base_delay_ms: default_retry_base_ms(),
            retry_max_delay_ms: default_retry_max_ms(),
            default_retries: default_retries(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSettings {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
    /// Zero retries forever.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    10
}

impl Default for ChannelSettings {
    fn default() -> Self {
        ChannelSettings {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSettings {
    #[serde(default = "default_max_failed")]
    pub max_failed: usize,
    #[serde(default = "default_replay_retries")]
    pub replay_retries: u32,
    #[serde(default)]
    pub routes: Routes,
}

fn default_max_failed() -> usize {
    100
}

fn default_replay_retries() -> u32 {
    2
}

impl Default for QueueSettings {
    fn default() -> Self {
        QueueSettings {
            max_failed: default_max_failed(),
            replay_retries: default_replay_retries(),
            routes: Routes::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: default_api_base_url(),
            realtime_url: default_realtime_url(),
            request: RequestSettings::default(),
            channel: ChannelSettings::default(),
            queue: QueueSettings::default(),
            invalidation: InvalidationMap::default(),
        }
    }
}

impl Config {
    /// Loads and validates the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Loads `path` if given, else the default location if it exists, else
    /// built-in defaults. An explicitly named file must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api_base_url must start with http:// or https://, got '{}'",
                self.api_base_url
            )));
        }
        if !(self.realtime_url.starts_with("ws://") || self.realtime_url.starts_with("wss://")) {
            return Err(Error::Config(format!(
                "realtime_url must start with ws:// or wss://, got '{}'",
                self.realtime_url
            )));
        }
        if self.request.timeout_ms == 0 {
            return Err(Error::Config("request.timeout_ms must be positive".to_string()));
        }
        if self.request.retry_base_delay_ms > self.request.retry_max_delay_ms {
            return Err(Error::Config(
                "request.retry_base_delay_ms exceeds request.retry_max_delay_ms".to_string(),
            ));
        }
        if self.channel.initial_delay_ms == 0 {
            return Err(Error::Config("channel.initial_delay_ms must be positive".to_string()));
        }
        for route in [&self.queue.routes.transaction, &self.queue.routes.profile_update] {
            if !route.path.starts_with('/') {
                return Err(Error::Config(format!("route path must start with '/', got '{}'", route.path)));
            }
        }
        Ok(())
    }

    pub fn request_config(&self) -> RequestConfig {
        RequestConfig {
            timeout: Duration::from_millis(self.request.timeout_ms),
            retry: RetryPolicy::new(
                Duration::from_millis(self.request.retry_base_delay_ms),
                Duration::from_millis(self.request.retry_max_delay_ms),
            ),
            default_retries: self.request.default_retries,
        }
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            url: self.realtime_url.clone(),
            initial_delay: Duration::from_millis(self.channel.initial_delay_ms),
            max_delay: Duration::from_secs(self.channel.max_delay_secs),
            max_retries: self.channel.max_retries,
            invalidation: self.invalidation.clone(),
        }
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_failed: self.queue.max_failed,
            replay_retries: self.queue.replay_retries,
            routes: self.queue.routes.clone(),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lajan").join(CONFIG_FILE_NAME))
}

pub fn default_state_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("lajan"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
