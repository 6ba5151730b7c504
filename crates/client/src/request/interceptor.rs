// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response interceptor chain.
//!
//! Interceptors run in registration order. Request interceptors see the
//! request after auth and idempotency headers are applied; response
//! interceptors see every response received, before it is classified.
//! Returning an error aborts the call with that error.

use std::sync::Arc;

use super::backend::{HttpRequest, HttpResponse};
use crate::error::Result;

pub type RequestInterceptor = Arc<dyn Fn(&mut HttpRequest) -> Result<()> + Send + Sync>;
pub type ResponseInterceptor =
    Arc<dyn Fn(&HttpRequest, &mut HttpResponse) -> Result<()> + Send + Sync>;

#[derive(Clone, Default)]
pub struct InterceptorChain {
    request: Vec<RequestInterceptor>,
    response: Vec<ResponseInterceptor>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request(&mut self, interceptor: RequestInterceptor) {
        self.request.push(interceptor);
    }

    pub fn add_response(&mut self, interceptor: ResponseInterceptor) {
        self.response.push(interceptor);
    }

    pub fn run_request(&self, request: &mut HttpRequest) -> Result<()> {
        self.request.iter().try_for_each(|f| f(request))
    }

    pub fn run_response(&self, request: &HttpRequest, response: &mut HttpResponse) -> Result<()> {
        self.response.iter().try_for_each(|f| f(request, response))
    }

    pub fn len(&self) -> usize {
        self.request.len() + self.response.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .finish()
    }
}
