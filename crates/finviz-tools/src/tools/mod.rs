pub mod edgar;
pub mod fields;
pub mod filings;
pub mod fundamentals;
pub mod market;
pub mod news;
pub mod screeners;

#[cfg(test)]
pub(crate) mod tests {
    use finviz_client::mock::ScriptedTransport;
    use finviz_client::{FinvizClient, FinvizConfig};
    use std::sync::Arc;
    use std::time::Duration;

    pub(crate) fn create_test_client(transport: Arc<ScriptedTransport>) -> FinvizClient {
        let config = FinvizConfig {
            api_key: Some("test-key".to_string()),
            base_url: "https://elite.finviz.test".to_string(),
            requests_per_minute: 0,
            timeout: Duration::from_secs(5),
            max_retries: 0,
            backoff_base: Duration::ZERO,
        };
        FinvizClient::with_transport(&config, transport)
    }
}
