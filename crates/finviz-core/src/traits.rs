use async_trait::async_trait;
use crate::FinvizError;

/// Status and body of a completed HTTP exchange, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A single GET against a remote endpoint.
///
/// Implementations report timeouts and connection failures as `FinvizError::Network`
/// and leave status handling to the caller; any status code is a successful exchange.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse, FinvizError>;
}
