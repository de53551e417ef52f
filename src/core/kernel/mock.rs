//! In-memory `HttpTransport` for tests and offline demos.
//!
//! Replies are queued per `(method, path)`; the last queued reply for a route
//! is sticky, so a single `respond` call answers every subsequent request.
//! Every request is recorded, including ones that end in an injected failure.

use crate::core::errors::ExchangeError;
use crate::core::kernel::transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Canned outcome for one request
#[derive(Debug, Clone)]
pub enum MockReply {
    Response(HttpResponse),
    Timeout,
    NetworkError,
    Delayed(Duration, Box<MockReply>),
}

impl MockReply {
    pub fn json(status: u16, body: Value) -> Self {
        Self::text(status, body.to_string())
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::Response(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.into(),
        })
    }

    pub const fn timeout() -> Self {
        Self::Timeout
    }

    pub const fn network_error() -> Self {
        Self::NetworkError
    }

    pub fn delayed(delay: Duration, reply: Self) -> Self {
        Self::Delayed(delay, Box::new(reply))
    }

    /// Adds a response header; no-op for failure replies
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match &mut self {
            Self::Response(response) => {
                response.headers.push((name.to_string(), value.to_string()));
            }
            Self::Delayed(_, inner) => {
                let reply = std::mem::replace(inner.as_mut(), Self::Timeout);
                **inner = reply.with_header(name, value);
            }
            Self::Timeout | Self::NetworkError => {}
        }
        self
    }
}

#[derive(Debug, Default)]
struct MockState {
    routes: HashMap<(Method, String), VecDeque<MockReply>>,
    requests: Vec<HttpRequest>,
}

#[derive(Debug, Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a reply for `method` requests to `path` (query string excluded)
    pub fn respond(&self, method: Method, path: &str, reply: MockReply) {
        self.lock()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.url.path() == path)
            .cloned()
            .collect()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.lock().requests.last().cloned()
    }

    fn next_reply(&self, request: &HttpRequest) -> MockReply {
        let mut state = self.lock();
        state.requests.push(request.clone());

        let key = (request.method.clone(), request.url.path().to_string());
        match state.routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(MockReply::Timeout),
            Some(queue) => queue.front().cloned().unwrap_or(MockReply::Timeout),
            None => MockReply::text(
                404,
                format!(
                    r#"{{"message":"no mock route for {} {}"}}"#,
                    key.0, key.1
                ),
            ),
        }
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ExchangeError> {
        let mut reply = self.next_reply(&request);
        loop {
            match reply {
                MockReply::Response(response) => return Ok(response),
                MockReply::Timeout => {
                    return Err(ExchangeError::Timeout(format!(
                        "mock timeout for {}",
                        request.url.path()
                    )))
                }
                MockReply::NetworkError => {
                    return Err(ExchangeError::NetworkError(format!(
                        "mock connection reset for {}",
                        request.url.path()
                    )))
                }
                MockReply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}
