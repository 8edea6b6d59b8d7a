use finviz_client::config::parse_var;
use finviz_core::FinvizError;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "finviz-screener admin@example.com";

#[derive(Debug, Clone, PartialEq)]
pub struct EdgarConfig {
    /// SEC asks for "<product> <contact email>".
    pub user_agent: String,
    pub requests_per_minute: u32,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for EdgarConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            requests_per_minute: 600,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff_base: Duration::from_millis(1000),
        }
    }
}

impl EdgarConfig {
    pub fn from_env() -> Result<Self, FinvizError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, FinvizError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            user_agent: lookup("SEC_USER_AGENT")
                .map(|ua| ua.trim().to_string())
                .filter(|ua| !ua.is_empty())
                .unwrap_or(defaults.user_agent),
            requests_per_minute: parse_var(&lookup, "EDGAR_RATE_LIMIT")?.unwrap_or(defaults.requests_per_minute),
            ..defaults
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EdgarConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.user_agent, "finviz-screener admin@example.com");
        assert_eq!(config.requests_per_minute, 600);
    }

    #[test]
    fn test_overrides_and_bad_rate() {
        let config = EdgarConfig::from_lookup(|name| match name {
            "SEC_USER_AGENT" => Some("acme-research ops@acme.test".to_string()),
            "EDGAR_RATE_LIMIT" => Some("120".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.user_agent, "acme-research ops@acme.test");
        assert_eq!(config.requests_per_minute, 120);

        let err = EdgarConfig::from_lookup(|name| (name == "EDGAR_RATE_LIMIT").then(|| "ten".to_string())).unwrap_err();
        assert!(matches!(err, FinvizError::Config(_)));
    }
}
