use finviz_core::FinvizError;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://elite.finviz.com";

#[derive(Debug, Clone, PartialEq)]
pub struct FinvizConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub requests_per_minute: u32,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for FinvizConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            requests_per_minute: 60,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_millis(1000),
        }
    }
}

impl FinvizConfig {
    /// Read `FINVIZ_*` variables, falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, FinvizError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, FinvizError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let api_key = lookup("FINVIZ_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!("FINVIZ_API_KEY not set, export endpoints will likely return a login page");
        }

        Ok(Self {
            api_key,
            base_url: lookup("FINVIZ_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            requests_per_minute: parse_var(&lookup, "FINVIZ_RATE_LIMIT")?
                .unwrap_or(defaults.requests_per_minute),
            timeout: parse_var(&lookup, "FINVIZ_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: parse_var(&lookup, "FINVIZ_MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            backoff_base: parse_var(&lookup, "FINVIZ_BACKOFF_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.backoff_base),
        })
    }
}

/// Parse an optional variable; present but malformed is a configuration error.
pub fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, FinvizError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| FinvizError::Config(format!("{}='{}': {}", name, raw, e))),
        _ => Ok(None),
    }
}
