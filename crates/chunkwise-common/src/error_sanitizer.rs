//! Error sanitization utilities for security
//!
//! Provider error bodies sometimes echo request headers back, and internal
//! failures can carry file paths. These helpers keep both out of responses
//! and log lines that leave the process.

use regex::Regex;
use std::sync::OnceLock;
use tracing::error;

fn credential_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)bearer\s+[A-Za-z0-9._\-]+",
            r"sk-[A-Za-z0-9_\-]{8,}",
            r#"(?i)(api[_-]?key["']?\s*[:=]\s*["']?)[^\s"',]+"#,
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Replace API keys and bearer tokens in `message` with `[REDACTED]`
pub fn redact_credentials(message: &str) -> String {
    credential_patterns()
        .iter()
        .fold(message.to_string(), |acc, pattern| {
            pattern
                .replace_all(&acc, |caps: &regex::Captures<'_>| {
                    caps.get(1)
                        .map_or_else(|| "[REDACTED]".to_string(), |prefix| {
                            format!("{}[REDACTED]", prefix.as_str())
                        })
                })
                .into_owned()
        })
}

/// Log `error` in full and return `user_message` tagged with a reference id
/// that appears in the log line
pub fn sanitize_with_message<E: std::fmt::Display>(
    error: E,
    context: &str,
    user_message: &str,
) -> String {
    let correlation_id = uuid::Uuid::new_v4();
    error!(
        correlation_id = %correlation_id,
        error = %redact_credentials(&error.to_string()),
        context = %context,
        "Internal error occurred"
    );

    format!("{user_message} (ref: {correlation_id})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_with_message() {
        let error = "Tokenizer table missing";
        let result = sanitize_with_message(error, "tokenizer", "Unable to process the document");
        assert!(result.starts_with("Unable to process the document (ref: "));
        assert!(!result.contains("Tokenizer table"));
    }

    #[test]
    fn test_redacts_bearer_tokens_and_keys() {
        let message = "401 Unauthorized: header Bearer abc.def-123 rejected for sk-proj1234567890";
        let redacted = redact_credentials(message);
        assert!(!redacted.contains("abc.def-123"), "got: {redacted}");
        assert!(!redacted.contains("sk-proj1234567890"), "got: {redacted}");
        assert!(redacted.contains("401 Unauthorized"));
    }

    #[test]
    fn test_redacts_api_key_assignments() {
        let redacted = redact_credentials("invalid api_key=live_abcdef in request");
        assert_eq!(redacted, "invalid api_key=[REDACTED] in request");
    }

    #[test]
    fn test_leaves_plain_messages_untouched() {
        let message = "server overloaded, retry later";
        assert_eq!(redact_credentials(message), message);
    }
}
