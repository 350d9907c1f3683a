//! Structured logging and credential-redaction utilities.
//!
//! This module configures the `tracing` ecosystem for the application,
//! supporting multiple output formats and providing utilities to keep
//! provider API keys out of logs when upstream error bodies echo them.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use crate::config::LoggingConfig;
use crate::error::Result;
use lazy_static::lazy_static;
use regex::Regex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the global tracing subscriber for the application.
///
/// Supports two output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `pretty` (default): Human-readable, colorized output for development.
///
/// Log levels are controlled via the `RUST_LOG` environment variable or
/// the provided `LoggingConfig`.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

lazy_static! {
    static ref SECRET_PATTERNS: Vec<(Regex, &'static str)> = [
        (r"Bearer\s+[A-Za-z0-9._\-]+", "Bearer [REDACTED]"),
        (r"sk-[A-Za-z0-9_\-]{8,}", "[REDACTED_API_KEY]"),
        (r"AIza[0-9A-Za-z_\-]{20,}", "[REDACTED_API_KEY]"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect();
}

/// Redacts provider credentials from a string before it is logged.
///
/// Upstream APIs occasionally echo the offending key back in error bodies;
/// anything that looks like a bearer token, an `sk-` key or a Google API key
/// is replaced with a placeholder.
pub fn sanitize(input: &str) -> String {
    let mut result = input.to_string();
    for (re, replacement) in SECRET_PATTERNS.iter() {
        result = re.replace_all(&result, *replacement).into_owned();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_bearer() {
        let output = sanitize("Authorization: Bearer abc.def-123");
        assert_eq!(output, "Authorization: Bearer [REDACTED]");
    }

    #[test]
    fn test_sanitize_openai_key() {
        let output = sanitize(r#"{"error":"Incorrect API key provided: sk-proj-abcdefgh1234"}"#);
        assert!(output.contains("[REDACTED_API_KEY]"));
        assert!(!output.contains("sk-proj-abcdefgh1234"));
    }

    #[test]
    fn test_sanitize_google_key() {
        let output = sanitize("key=AIzaSyA1234567890abcdefghijklmnop");
        assert_eq!(output, "key=[REDACTED_API_KEY]");
    }

    #[test]
    fn test_sanitize_leaves_plain_text() {
        assert_eq!(sanitize("model overloaded"), "model overloaded");
    }
}
