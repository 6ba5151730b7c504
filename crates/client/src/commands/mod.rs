// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod fetch;
pub mod queue;
pub mod watch;

use std::path::PathBuf;

use lajan_core::{KvStore, QueuedMutation};

use crate::cli::{Command, GlobalArgs};
use crate::config::{default_state_dir, Config};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::realtime::Transport;
use crate::request::AuthToken;

/// Resolves the state directory: flag, then platform default.
pub fn state_dir(global: &GlobalArgs) -> Result<PathBuf> {
    global
        .state_dir
        .clone()
        .or_else(default_state_dir)
        .ok_or_else(|| Error::Config("cannot determine a state directory; pass --state-dir".into()))
}

/// Opens the production context described by the global flags.
pub fn open_context(global: &GlobalArgs) -> Result<Context> {
    let config = Config::load_or_default(global.config.as_deref())?;
    let ctx = Context::init(config, &state_dir(global)?)?;
    if let Some(token) = &global.token {
        ctx.set_auth_token(Some(AuthToken::new(token.clone())));
    }
    if global.offline {
        ctx.connectivity().set_online(false);
    }
    Ok(ctx)
}

/// Runs one command against `ctx`.
pub async fn dispatch<K, T>(ctx: &mut Context<K, T>, command: Command) -> Result<()>
where
    K: KvStore + 'static,
    T: Transport,
{
    match command {
        Command::Enqueue { mutation, now } => queue::enqueue(ctx, mutation, now).await,
        Command::Pending { json } => queue::pending(ctx, json),
        Command::Failed { json } => queue::failed(ctx, json),
        Command::Sync { json } => queue::sync(ctx, json).await,
        Command::RetryFailed { json } => queue::retry_failed(ctx, json).await,
        Command::Get { path, ttl, query } => fetch::get(ctx, &path, ttl, &query).await,
        Command::Watch { count } => watch::run(ctx, count).await,
    }
}

/// Splits `key=value`; the value may contain further `=`.
pub(crate) fn parse_assignment(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(Error::Config(format!("expected KEY=VALUE, got '{}'", arg))),
    }
}

/// One line per mutation: id, kind, status, attempts and last error.
pub(crate) fn format_mutation_line(mutation: &QueuedMutation) -> String {
    let mut line = format!(
        "{}  {}  {}  attempts={}",
        mutation.id,
        mutation.kind.as_str(),
        mutation.status.as_str(),
        mutation.attempts
    );
    if let Some(error) = &mutation.last_error {
        line.push_str("  ");
        line.push_str(error);
    }
    line
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
