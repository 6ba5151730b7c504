// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const QUICKSTART_HELP: &str = "\
Get started:
  lajan --offline enqueue transfer --recipient +50937001122 --amount 500
  lajan pending                 List queued mutations
  lajan sync                    Replay the queue now
  lajan get /wallet --ttl 30    Cached authenticated read
  lajan watch --count 5         Print realtime messages";

#[derive(Parser)]
#[command(name = "lajan")]
#[command(about = "Offline-first payments client: queue, sync and realtime tools")]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file (default: ~/.config/lajan/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding queue.db (default: platform data dir)
    #[arg(long, global = true, env = "LAJAN_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Bearer token for authenticated calls
    #[arg(long, global = true, env = "LAJAN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Treat the network as unavailable
    #[arg(long, global = true)]
    pub offline: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Queue a mutation for delivery
    Enqueue {
        #[command(subcommand)]
        mutation: EnqueueCommand,

        /// Try to send immediately; queue only if that fails transiently
        #[arg(long, global = true)]
        now: bool,
    },

    /// List pending and in-flight mutations
    Pending {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List permanently failed mutations
    Failed {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Replay pending mutations
    Sync {
        #[arg(long)]
        json: bool,
    },

    /// Move failed mutations back to pending and replay
    RetryFailed {
        #[arg(long)]
        json: bool,
    },

    /// Authenticated GET, printing the JSON body
    Get {
        /// Request path, e.g. /wallet
        path: String,

        /// Cache lifetime in seconds
        #[arg(long, default_value_t = 0)]
        ttl: u64,

        /// Query parameter (repeatable)
        #[arg(long = "query", short = 'q', value_name = "KEY=VALUE")]
        query: Vec<String>,
    },

    /// Connect the realtime channel and print incoming messages
    Watch {
        /// Stop after this many messages (0 = until interrupted)
        #[arg(long, short = 'n', default_value_t = 0)]
        count: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum EnqueueCommand {
    /// Send money to a recipient
    #[command(after_help = "Examples:\n  \
        lajan enqueue transfer --recipient +50937001122 --amount 500\n  \
        lajan enqueue transfer --recipient +50937001122 --amount 12.5 --currency USD --note rent")]
    Transfer {
        #[arg(long)]
        recipient: String,

        #[arg(long)]
        amount: f64,

        #[arg(long, default_value = "HTG")]
        currency: String,

        #[arg(long)]
        note: Option<String>,
    },

    /// Update profile fields
    Profile {
        /// Field assignment (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE", required = true)]
        set: Vec<String>,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
