// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use lajan_core::KvStore;

use crate::context::Context;
use crate::error::Result;
use crate::realtime::Transport;
use crate::request::{Method, RequestOptions};

use super::parse_assignment;

/// Authenticated GET; a positive `ttl_secs` serves repeats from the cache.
pub async fn get<K: KvStore + 'static, T: Transport>(
    ctx: &Context<K, T>,
    path: &str,
    ttl_secs: u64,
    query: &[String],
) -> Result<()> {
    let mut options = RequestOptions::new().cache_ttl(Duration::from_secs(ttl_secs));
    for arg in query {
        let (key, value) = parse_assignment(arg)?;
        options = options.query(key, value);
    }
    let body = ctx.client().request(Method::Get, path, options).await?;
    println!("{}", serde_json::to_string_pretty(&*body)?);
    Ok(())
}
