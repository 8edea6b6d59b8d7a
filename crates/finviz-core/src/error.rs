use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FinvizError {
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    /// SEC EDGAR answered 401/403, usually because the User-Agent lacks a contact.
    #[error("SEC EDGAR refused the request: {0}")]
    EdgarAccess(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl FinvizError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Classify an HTTP status into the error taxonomy. Only meaningful for non-2xx codes.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = snippet(body);
        match status {
            401 | 403 => Self::Authentication(format!("HTTP {}: {}", status, message)),
            429 => Self::RateLimited(format!("HTTP 429: {}", message)),
            500..=599 => Self::Network(format!("HTTP {}: {}", status, message)),
            _ => Self::Http { status, message },
        }
    }

    /// Whether the failure may resolve on retry (timeouts, connection errors, 429, 5xx).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::Network(_))
    }

    /// Short actionable suffix for user-facing messages.
    pub fn user_hint(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "your input was invalid",
            Self::Authentication(_) => "check your FINVIZ_API_KEY",
            Self::EdgarAccess(_) => "set SEC_USER_AGENT to a name and contact email",
            Self::RateLimited(_) | Self::Network(_) => "the request failed, try again later",
            Self::Http { .. } => "the service rejected the request",
            Self::Parse(_) => "the response could not be understood",
            Self::NotFound(_) => "nothing matched the request",
            Self::Config(_) => "check your environment configuration",
        }
    }
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
