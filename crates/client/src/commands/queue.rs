// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use lajan_core::{KvStore, MutationKind, QueuedMutation};
use serde_json::{json, Map, Value};

use crate::cli::EnqueueCommand;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::realtime::Transport;
use crate::sync::{Submission, SyncReport};

use super::{format_mutation_line, parse_assignment};

pub async fn enqueue<K, T>(ctx: &Context<K, T>, mutation: EnqueueCommand, now: bool) -> Result<()>
where
    K: KvStore + 'static,
    T: Transport,
{
    let (kind, payload) = build_payload(mutation)?;
    if now {
        match ctx.sync().submit(kind, payload).await? {
            Submission::Delivered { id, .. } => println!("delivered {}", id),
            Submission::Queued { id } => println!("queued {}", id),
        }
    } else {
        let id = ctx.sync().enqueue(kind, payload)?;
        println!("queued {}", id);
    }
    Ok(())
}

pub fn pending<K: KvStore + 'static, T: Transport>(ctx: &Context<K, T>, json: bool) -> Result<()> {
    print_mutations(&ctx.sync().pending_transactions()?, json, "no pending mutations")
}

pub fn failed<K: KvStore + 'static, T: Transport>(ctx: &Context<K, T>, json: bool) -> Result<()> {
    print_mutations(&ctx.sync().failed_transactions()?, json, "no failed mutations")
}

pub async fn sync<K: KvStore + 'static, T: Transport>(ctx: &Context<K, T>, json: bool) -> Result<()> {
    let report = ctx.sync().trigger_sync().await?;
    print_report(&report, json)
}

pub async fn retry_failed<K: KvStore + 'static, T: Transport>(
    ctx: &Context<K, T>,
    json: bool,
) -> Result<()> {
    let report = ctx.sync().retry_failed_sync().await?;
    print_report(&report, json)
}

/// Turns CLI arguments into a mutation kind and its request body.
pub(crate) fn build_payload(mutation: EnqueueCommand) -> Result<(MutationKind, Value)> {
    match mutation {
        EnqueueCommand::Transfer { recipient, amount, currency, note } => {
            if !(amount.is_finite() && amount > 0.0) {
                return Err(Error::Config(format!("amount must be positive, got {}", amount)));
            }
            let mut payload = json!({
                "recipient": recipient,
                "amount": amount,
                "currency": currency.to_uppercase(),
            });
            if let Some(note) = note {
                payload["note"] = Value::String(note);
            }
            Ok((MutationKind::Transaction, payload))
        }
        EnqueueCommand::Profile { set } => {
            let mut fields = Map::new();
            for arg in &set {
                let (key, value) = parse_assignment(arg)?;
                fields.insert(key, Value::String(value));
            }
            Ok((MutationKind::ProfileUpdate, Value::Object(fields)))
        }
    }
}

pub(crate) fn format_report(report: &SyncReport) -> String {
    format!(
        "delivered {}, deferred {}, failed {}, skipped {}",
        report.delivered, report.deferred, report.failed, report.skipped
    )
}

fn print_mutations(mutations: &[QueuedMutation], json: bool, empty: &str) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(mutations)?);
    } else if mutations.is_empty() {
        println!("{}", empty);
    } else {
        for mutation in mutations {
            println!("{}", format_mutation_line(mutation));
        }
    }
    Ok(())
}

fn print_report(report: &SyncReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", format_report(report));
    }
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
