//! Scripted in-memory transport for exercising clients without a network.

use async_trait::async_trait;
use finviz_core::{FinvizError, HttpTransport, RawResponse};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A GET the transport received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Replays queued responses in order and records every request.
///
/// An exhausted script answers with a `Network` error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<RawResponse, FinvizError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, status: u16, body: impl Into<String>) -> Self {
        self.push_response(status, body);
        self
    }

    pub fn with_error(self, error: FinvizError) -> Self {
        self.push_error(error);
        self
    }

    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        lock(&self.responses).push_back(Ok(RawResponse::new(status, body)));
    }

    pub fn push_error(&self, error: FinvizError) {
        lock(&self.responses).push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse, FinvizError> {
        lock(&self.requests).push(RecordedRequest {
            url: url.to_string(),
            query: query.to_vec(),
        });
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Err(FinvizError::Network("no scripted response left".to_string())))
    }
}
