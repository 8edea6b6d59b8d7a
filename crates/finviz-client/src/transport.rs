use async_trait::async_trait;
use finviz_core::{FinvizError, HttpTransport, RawResponse};
use reqwest::Client;
use std::time::Duration;

/// `HttpTransport` backed by a pooled reqwest client.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, FinvizError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FinvizError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// SEC rejects requests without an identifying User-Agent.
    pub fn with_user_agent(timeout: Duration, user_agent: &str) -> Result<Self, FinvizError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FinvizError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse, FinvizError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(RawResponse::new(status, body))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> FinvizError {
    if e.is_timeout() {
        FinvizError::Network(format!("request timed out: {}", e))
    } else if e.is_connect() {
        FinvizError::Network(format!("connection failed: {}", e))
    } else if e.is_builder() {
        FinvizError::validation("url", e.to_string())
    } else if e.is_decode() {
        FinvizError::Parse(format!("failed to read response body: {}", e))
    } else {
        FinvizError::Network(e.to_string())
    }
}
