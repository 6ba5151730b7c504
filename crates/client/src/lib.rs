// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! lajan: client-side resilience layer for a payments client.
//!
//! # Main Components
//!
//! - [`RequestClient`] - authenticated HTTP with a response cache, retries
//!   and interceptors
//! - [`ChannelManager`] - one realtime connection with reconnect backoff and
//!   cache invalidation
//! - [`SyncCoordinator`] - durable offline queue replayed when connectivity
//!   returns
//! - [`ConnectivityMonitor`] - online/offline state shared by all of the above
//! - [`Context`] - owns one of each, with explicit init and teardown
//!
//! ```rust,ignore
//! use lajan::{Config, Context};
//!
//! let ctx = Context::init(Config::load_or_default(None)?, state_dir)?;
//! let id = ctx.sync().enqueue(MutationKind::Transaction, payload)?;
//! ctx.sync().trigger_sync().await?;
//! ctx.teardown().await;
//! ```

mod cli;
mod commands;

pub mod backoff;
pub mod config;
pub mod connectivity;
pub mod context;
pub mod error;
pub mod realtime;
pub mod request;
pub mod sync;

#[cfg(test)]
mod test_helpers;

use std::fs;
use std::path::Path;

pub use cli::{Cli, Command, EnqueueCommand, GlobalArgs};
pub use config::Config;
pub use connectivity::ConnectivityMonitor;
pub use context::{Context, ContextParts};
pub use error::{Error, Result};
pub use realtime::{ChannelManager, ChannelState};
pub use request::{AuthToken, Method, RequestClient, RequestOptions};
pub use sync::{SyncCoordinator, SyncReport};

/// Execute a CLI invocation: set up logging, open the context, run the
/// command, tear down.
pub fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.global.log_file.as_deref());

    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let mut ctx = commands::open_context(&cli.global)?;
        let outcome = commands::dispatch(&mut ctx, cli.command).await;
        ctx.teardown().await;
        outcome
    })
}

/// Installs the tracing subscriber. `RUST_LOG` overrides the default
/// `warn` level. Logs go to `log_file` when it can be opened, else stderr.
pub fn setup_logging(log_file: Option<&Path>) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file = log_file.and_then(|path| {
        fs::OpenOptions::new().create(true).append(true).open(path).ok()
    });
    if let Some(file) = file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
