use crate::rate_limit::RateLimiter;
use finviz_core::{FinvizError, HttpTransport, RawResponse};
use std::sync::Arc;
use std::time::Duration;

/// Query parameters never written to logs.
const REDACTED_PARAMS: &[&str] = &["auth"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self { max_retries, backoff_base }
    }

    /// Delay before retry number `attempt + 1`: base * 2^attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Rate-limited, retrying GET on top of any [`HttpTransport`].
///
/// Returns only 2xx responses. Other statuses are classified with
/// [`FinvizError::from_status`]; transient ones are retried with exponential backoff.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn HttpTransport>,
    limiter: RateLimiter,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, limiter: RateLimiter, policy: RetryPolicy) -> Self {
        Self { transport, limiter, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn get(&self, url: &str, query: &[(String, String)]) -> Result<RawResponse, FinvizError> {
        let mut attempt: u32 = 0;
        loop {
            self.limiter.acquire().await;
            tracing::debug!("GET {} {}", url, describe_query(query));

            let err = match self.transport.get(url, query).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => FinvizError::from_status(response.status, &response.body),
                Err(e) => e,
            };

            if !err.is_transient() {
                return Err(err);
            }
            if attempt >= self.policy.max_retries {
                tracing::warn!("Giving up on {} after {} attempts: {}", url, attempt + 1, err);
                return Err(exhausted(err, attempt + 1));
            }

            let delay = self.policy.delay_for(attempt);
            tracing::warn!(
                "{} for {}, retry {}/{} in {}ms",
                err,
                url,
                attempt + 1,
                self.policy.max_retries,
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn exhausted(err: FinvizError, attempts: u32) -> FinvizError {
    match err {
        FinvizError::RateLimited(msg) => {
            FinvizError::RateLimited(format!("{} (gave up after {} attempts)", msg, attempts))
        }
        FinvizError::Network(msg) => {
            FinvizError::Network(format!("{} (gave up after {} attempts)", msg, attempts))
        }
        other => other,
    }
}

fn describe_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(k, v)| {
            if REDACTED_PARAMS.contains(&k.as_str()) {
                format!("{}=***", k)
            } else {
                format!("{}={}", k, v)
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedTransport;
    use tokio::time::Instant;

    fn create_test_fetcher(transport: Arc<ScriptedTransport>, max_retries: u32) -> Fetcher {
        Fetcher::new(
            transport,
            RateLimiter::new(Duration::ZERO),
            RetryPolicy::new(max_retries, Duration::from_millis(1000)),
        )
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_auth_param_redacted() {
        let query = vec![
            ("v".to_string(), "151".to_string()),
            ("auth".to_string(), "secret-key".to_string()),
        ];
        let described = describe_query(&query);
        assert_eq!(described, "v=151&auth=***");
        assert!(!described.contains("secret-key"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_server_errors_then_succeeds() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_response(503, "unavailable")
                .with_response(503, "unavailable")
                .with_response(503, "unavailable")
                .with_response(200, "Ticker\nNKE\n"),
        );
        let fetcher = create_test_fetcher(transport.clone(), 3);

        let start = Instant::now();
        let response = fetcher.get("https://example.test/export", &[]).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(transport.request_count(), 4);
        // 1s + 2s + 4s of backoff
        assert!(start.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_is_not_retried() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_response(401, "unauthorized")
                .with_response(200, "never reached"),
        );
        let fetcher = create_test_fetcher(transport.clone(), 3);

        let err = fetcher.get("https://example.test/export", &[]).await.unwrap_err();
        assert!(matches!(err, FinvizError::Authentication(_)));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new().with_response(404, "missing"));
        let fetcher = create_test_fetcher(transport.clone(), 3);

        let err = fetcher.get("https://example.test/x", &[]).await.unwrap_err();
        assert!(matches!(err, FinvizError::Http { status: 404, .. }));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_surfaces_after_retries() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_response(429, "slow down")
                .with_response(429, "slow down")
                .with_response(429, "slow down"),
        );
        let fetcher = create_test_fetcher(transport.clone(), 2);

        let err = fetcher.get("https://example.test/x", &[]).await.unwrap_err();
        match err {
            FinvizError::RateLimited(msg) => assert!(msg.contains("3 attempts")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_are_retried() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .with_error(FinvizError::Network("request timed out".to_string()))
                .with_response(200, "ok"),
        );
        let fetcher = create_test_fetcher(transport.clone(), 1);

        let response = fetcher.get("https://example.test/x", &[]).await.unwrap();
        assert_eq!(response.body, "ok");
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_fails_fast() {
        let transport = Arc::new(ScriptedTransport::new().with_response(500, "boom"));
        let fetcher = create_test_fetcher(transport.clone(), 0);
        let err = fetcher.get("https://example.test/x", &[]).await.unwrap_err();
        assert!(matches!(err, FinvizError::Network(_)));
        assert_eq!(transport.request_count(), 1);
    }
}
