// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The request client.
//!
//! A single `request` call goes through, in order: cache lookup (GET with a
//! TTL), auth and idempotency headers, request interceptors, the offline
//! check, the HTTP exchange, response interceptors, classification, and
//! bounded retry of transient failures.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lajan_core::{ClockSource, SystemClock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::backend::{HttpBackend, HttpRequest, HttpResponse, Method};
use super::cache::{cache_key, ResponseCache};
use super::classify::{classify_response, classify_transport};
use super::interceptor::InterceptorChain;
use crate::backoff::RetryPolicy;
use crate::connectivity::ConnectivityMonitor;
use crate::error::{Error, Result};

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Bearer credential for authenticated calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        AuthToken { token: token.into(), expires_at: None }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Client-wide defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestConfig {
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Retries for idempotent methods when the call does not say otherwise.
    pub default_retries: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        RequestConfig {
            timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
            default_retries: 2,
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub require_auth: bool,
    /// Zero disables caching for this call.
    pub cache_ttl: Duration,
    /// `Some(n)` allows n retries (n + 1 attempts). `None` uses the client
    /// default for idempotent methods and no retries otherwise.
    pub retries: Option<u32>,
    pub idempotency_key: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        RequestOptions {
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            require_auth: true,
            cache_ttl: Duration::ZERO,
            retries: None,
            idempotency_key: None,
            timeout: None,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Marks the call as not needing credentials.
    pub fn public(mut self) -> Self {
        self.require_auth = false;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

pub struct RequestClient {
    backend: Arc<dyn HttpBackend>,
    connectivity: Arc<ConnectivityMonitor>,
    clock: Arc<dyn ClockSource>,
    config: RequestConfig,
    auth: RwLock<Option<AuthToken>>,
    cache: Mutex<ResponseCache>,
    interceptors: RwLock<InterceptorChain>,
}

impl RequestClient {
    pub fn new(
        backend: Arc<dyn HttpBackend>,
        connectivity: Arc<ConnectivityMonitor>,
        config: RequestConfig,
    ) -> Self {
        Self::with_clock(backend, connectivity, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        backend: Arc<dyn HttpBackend>,
        connectivity: Arc<ConnectivityMonitor>,
        config: RequestConfig,
        clock: Arc<dyn ClockSource>,
    ) -> Self {
        RequestClient {
            backend,
            connectivity,
            clock,
            config,
            auth: RwLock::new(None),
            cache: Mutex::new(ResponseCache::new()),
            interceptors: RwLock::new(InterceptorChain::new()),
        }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn set_auth_token(&self, token: Option<AuthToken>) {
        *self.auth.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    /// The current bearer token, unless missing or expired.
    pub fn bearer_token(&self) -> Option<String> {
        let now = self.clock.now();
        let auth = self.auth.read().unwrap_or_else(|e| e.into_inner());
        auth.as_ref().filter(|t| !t.is_expired(now)).map(|t| t.token.clone())
    }

    pub fn auth_header(&self) -> Option<String> {
        self.bearer_token().map(|t| format!("Bearer {t}"))
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }

    pub fn add_request_interceptor<F>(&self, interceptor: F)
    where
        F: Fn(&mut HttpRequest) -> Result<()> + Send + Sync + 'static,
    {
        self.interceptors.write().unwrap_or_else(|e| e.into_inner()).add_request(Arc::new(interceptor));
    }

    pub fn add_response_interceptor<F>(&self, interceptor: F)
    where
        F: Fn(&HttpRequest, &mut HttpResponse) -> Result<()> + Send + Sync + 'static,
    {
        self.interceptors.write().unwrap_or_else(|e| e.into_inner()).add_response(Arc::new(interceptor));
    }

    /// Drops cached responses whose key starts with `prefix`.
    pub fn invalidate_cache(&self, prefix: &str) -> usize {
        let removed = self.cache().invalidate(prefix);
        if removed > 0 {
            tracing::debug!(prefix, removed, "cache invalidated");
        }
        removed
    }

    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    pub fn cached_entries(&self) -> usize {
        self.cache().len()
    }

    /// Performs a call and returns the decoded JSON payload. An empty body
    /// decodes to `null`; a 2xx body that is not JSON is returned as a
    /// string.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        options: RequestOptions,
    ) -> Result<Arc<Value>> {
        let key = cache_key(path, &options.query);
        let cacheable = method.is_cacheable() && !options.cache_ttl.is_zero();
        let generation = {
            let mut cache = self.cache();
            if cacheable {
                if let Some(hit) = cache.get(&key, self.clock.now_ms()) {
                    tracing::debug!(%method, path, "cache hit");
                    return Ok(hit);
                }
            }
            cache.generation()
        };

        let mut retries_left = options.retries.unwrap_or(if method.is_idempotent() {
            self.config.default_retries
        } else {
            0
        });
        let cache_ttl = options.cache_ttl;
        let mut request = self.prepare(method, path, options)?;
        let interceptors = self.interceptors.read().unwrap_or_else(|e| e.into_inner()).clone();
        interceptors.run_request(&mut request)?;

        let mut attempt: u32 = 0;
        loop {
            if !self.connectivity.is_online() {
                return Err(Error::NetworkUnavailable);
            }

            match self.attempt(&request, &interceptors).await {
                Ok(response) => {
                    let payload = Arc::new(decode_body(&response.body));
                    if cacheable {
                        let now = self.clock.now_ms();
                        let stored = self.cache().insert_since(
                            key,
                            Arc::clone(&payload),
                            now,
                            cache_ttl,
                            generation,
                        );
                        if !stored {
                            tracing::debug!(%method, path, "invalidated during fetch, not cached");
                        }
                    }
                    return Ok(payload);
                }
                Err(err) => {
                    if matches!(err, Error::Unauthenticated) {
                        tracing::warn!(%method, path, "credentials rejected, clearing token");
                        self.set_auth_token(None);
                    }
                    if retries_left == 0 || !err.is_retryable() {
                        return Err(err);
                    }
                    let delay = self.config.retry.delay_for(attempt, err.retry_after());
                    tracing::warn!(%method, path, attempt, ?delay, "request failed, retrying: {}", err);
                    tokio::time::sleep(delay).await;
                    retries_left -= 1;
                    attempt += 1;
                }
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        let value = self.request(Method::Get, path, options).await?;
        decode_typed(&value)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T> {
        let options = options.body(serde_json::to_value(body)?);
        let value = self.request(Method::Post, path, options).await?;
        decode_typed(&value)
    }

    pub async fn patch_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> Result<T> {
        let options = options.body(serde_json::to_value(body)?);
        let value = self.request(Method::Patch, path, options).await?;
        decode_typed(&value)
    }

    fn prepare(&self, method: Method, path: &str, options: RequestOptions) -> Result<HttpRequest> {
        let mut request =
            HttpRequest::new(method, path, options.timeout.unwrap_or(self.config.timeout));
        request.query = options.query;
        request.body = options.body;
        request.set_header("Accept", "application/json");
        for (name, value) in options.headers {
            request.set_header(name, value);
        }
        if options.require_auth {
            let header = self.auth_header().ok_or(Error::Unauthenticated)?;
            request.set_header("Authorization", header);
        }
        if let Some(key) = options.idempotency_key {
            request.set_header(IDEMPOTENCY_HEADER, key);
        }
        Ok(request)
    }

    async fn attempt(
        &self,
        request: &HttpRequest,
        interceptors: &InterceptorChain,
    ) -> Result<HttpResponse> {
        let mut response = match self.backend.execute(request.clone()).await {
            Ok(response) => response,
            Err(failure) => {
                tracing::debug!(path = %request.path, "transport failure: {}", failure);
                return Err(classify_transport(&failure));
            }
        };
        interceptors.run_response(request, &mut response)?;
        match classify_response(&response, self.clock.now()) {
            Some(err) => Err(err),
            None => Ok(response),
        }
    }

    fn cache(&self) -> MutexGuard<'_, ResponseCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Success is decided by the status, so the body never turns a 2xx into an
/// error.
fn decode_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

fn decode_typed<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| Error::InvalidResponse(e.to_string()))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
