//! Page-database error types.

use thiserror::Error;

/// Result type for page operations.
pub type PagesResult<T> = Result<T, PagesError>;

/// Errors from the page-database API.
#[derive(Debug, Error)]
pub enum PagesError {
    #[error("Pages client misconfigured: {0}")]
    ConfigError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        retry_after_ms: Option<u64>,
    },

    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),
}

impl PagesError {
    /// Whether the operation is worth retrying.
    ///
    /// Transport errors, timeouts, rate limits and server errors are
    /// transient; validation failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::Timeout => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Server-requested backoff, when the API sent one.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::Api { retry_after_ms, .. } => *retry_after_ms,
            _ => None,
        }
    }

    /// For validation failures, guess which page field tripped the API.
    pub fn field_hint(&self) -> Option<&'static str> {
        let Self::Api { status, message, .. } = self else {
            return None;
        };
        if *status != 400 {
            return None;
        }
        let msg = message.to_lowercase();
        if msg.contains("multi_select") || msg.contains("option") {
            Some("title/tag option names (length or characters)")
        } else if msg.contains("rich_text") || msg.contains("2000") {
            Some("summary rich-text length")
        } else if msg.contains("title") {
            Some("page title property")
        } else if msg.contains("url") {
            Some("URL property format")
        } else {
            Some("page properties (schema mismatch)")
        }
    }
}

impl From<reqwest::Error> for PagesError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::RequestFailed(e.to_string())
        }
    }
}
