// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request client: the single entry point for HTTP calls to the backend.
//!
//! ```text
//! caller ──► cache? ──► auth/idempotency ──► interceptors ──► online? ──► backend
//!                                                                  │
//!            ◄── payload (cached) ◄── classify ◄── interceptors ◄──┘
//!                                        │
//!                                        └─ transient: backoff, retry (bounded)
//! ```

mod backend;
mod cache;
mod classify;
mod client;
mod interceptor;

pub use backend::{
    BackendFuture, HttpBackend, HttpRequest, HttpResponse, Method, ReqwestBackend,
    TransportFailure,
};
pub use cache::{cache_key, CacheEntry, ResponseCache};
pub use classify::{classify_response, classify_transport, extract_message, parse_retry_after};
pub use client::{AuthToken, RequestClient, RequestConfig, RequestOptions, IDEMPOTENCY_HEADER};
pub use interceptor::{InterceptorChain, RequestInterceptor, ResponseInterceptor};
