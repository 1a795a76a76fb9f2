//! Error types for the chunkwise-llm crate
//!
//! Every completion failure (HTTP status, transport error, malformed
//! payload, local timeout) becomes an [`ApiError`], which callers classify
//! with [`ApiError::class`] to pick a retry strategy.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for completion operations
pub type LlmResult<T> = Result<T, ApiError>;

/// A failed completion call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("completion failed ({}): {message}", status_label(.status_code))]
pub struct ApiError {
    /// HTTP status, absent for timeouts, transport and payload failures
    pub status_code: Option<u16>,
    pub message: String,
}

fn status_label(status_code: &Option<u16>) -> String {
    status_code.map_or_else(|| "no status".to_string(), |s| format!("HTTP {s}"))
}

/// How a failure should be treated by the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerFault,
    /// Any other HTTP 4xx
    ClientFault,
    /// No status code, or one outside the error ranges
    Unknown,
}

impl ErrorClass {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::ServerFault => "server_fault",
            Self::ClientFault => "client_fault",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApiError {
    pub fn new(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    /// Failure with an HTTP status
    pub fn http(status_code: u16, message: impl Into<String>) -> Self {
        Self::new(Some(status_code), message)
    }

    /// Failure with no HTTP status (transport, payload)
    pub fn without_status(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    /// The local deadline passed before the provider answered
    pub fn timeout(after: Duration) -> Self {
        Self::without_status(format!("request timed out after {}s", after.as_secs_f64()))
    }

    pub const fn class(&self) -> ErrorClass {
        match self.status_code {
            Some(429) => ErrorClass::RateLimited,
            Some(500..) => ErrorClass::ServerFault,
            Some(400..=499) => ErrorClass::ClientFault,
            _ => ErrorClass::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_by_status() {
        assert_eq!(ApiError::http(429, "slow down").class(), ErrorClass::RateLimited);
        assert_eq!(ApiError::http(500, "boom").class(), ErrorClass::ServerFault);
        assert_eq!(ApiError::http(503, "overloaded").class(), ErrorClass::ServerFault);
        assert_eq!(ApiError::http(400, "bad request").class(), ErrorClass::ClientFault);
        assert_eq!(ApiError::http(401, "unauthorized").class(), ErrorClass::ClientFault);
        assert_eq!(ApiError::without_status("reset").class(), ErrorClass::Unknown);
        assert_eq!(ApiError::http(302, "moved").class(), ErrorClass::Unknown);
    }

    #[test]
    fn test_timeout_has_no_status() {
        let err = ApiError::timeout(Duration::from_secs(33));
        assert_eq!(err.status_code, None);
        assert_eq!(err.class(), ErrorClass::Unknown);
        assert!(err.to_string().contains("timed out after 33s"));
    }

    #[test]
    fn test_display_includes_status() {
        let err = ApiError::http(429, "rate limit exceeded");
        assert_eq!(err.to_string(), "completion failed (HTTP 429): rate limit exceeded");
        assert_eq!(ErrorClass::RateLimited.to_string(), "rate_limited");
    }
}
