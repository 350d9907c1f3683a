// Error types for the assist governor
// Author: kelexine (https://github.com/kelexine)

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GovernorError {
    #[error("Upstream rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Upstream service unavailable ({status}): {message}")]
    ServiceUnavailable { status: u16, message: String },

    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Upstream quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Request queue cleared")]
    QueueCleared,

    #[error("Upstream request failed{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Unclassified { status: Option<u16>, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config parsing error: {0}")]
    ConfigParsing(#[from] config::ConfigError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by retry decisions, suggestions and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    ServiceUnavailable,
    Timeout,
    QuotaExceeded,
    QueueCleared,
    Unclassified,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::QueueCleared => "queue_cleared",
            ErrorKind::Unclassified => "unclassified",
        }
    }
}

impl GovernorError {
    /// Normalize an upstream HTTP failure into the governor taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            body.chars().take(512).collect()
        };

        match status {
            429 if signals_quota(body) => GovernorError::QuotaExceeded(message),
            429 => GovernorError::RateLimited(message),
            500..=599 => GovernorError::ServiceUnavailable { status, message },
            _ => GovernorError::Unclassified {
                status: Some(status),
                message,
            },
        }
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        GovernorError::Unclassified {
            status: None,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GovernorError::RateLimited(_) => ErrorKind::RateLimited,
            GovernorError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            GovernorError::Timeout(_) => ErrorKind::Timeout,
            GovernorError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            GovernorError::QueueCleared => ErrorKind::QueueCleared,
            _ => ErrorKind::Unclassified,
        }
    }

    /// Upstream HTTP status, where one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            GovernorError::RateLimited(_) => Some(429),
            GovernorError::ServiceUnavailable { status, .. } => Some(*status),
            GovernorError::Unclassified { status, .. } => *status,
            _ => None,
        }
    }

    /// Only upstream throttling and server-side failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimited | ErrorKind::ServiceUnavailable
        )
    }
}

/// Markers of an exhausted plan or billing quota. A bare mention of "quota"
/// is not enough: Gemini's ordinary per-minute 429 says "check quota".
const QUOTA_MARKERS: &[&str] = &[
    "insufficient_quota",
    "exceeded your current quota",
    "billing",
];

fn signals_quota(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    QUOTA_MARKERS.iter().any(|marker| lower.contains(marker))
}

impl From<reqwest::Error> for GovernorError {
    /// Timeouts are mapped by the caller, which knows the configured deadline.
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => GovernorError::from_status(status.as_u16(), &err.to_string()),
            None => GovernorError::unclassified(err.to_string()),
        }
    }
}

// Convert GovernorError to HTTP responses for Axum
impl IntoResponse for GovernorError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            GovernorError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout_error"),
            GovernorError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limit_error"),
            GovernorError::QuotaExceeded(_) => (StatusCode::SERVICE_UNAVAILABLE, "quota_error"),
            GovernorError::ServiceUnavailable { .. } | GovernorError::QueueCleared => {
                (StatusCode::SERVICE_UNAVAILABLE, "overloaded_error")
            }
            GovernorError::InvalidRequest(_) | GovernorError::Json(_) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error")
            }
            GovernorError::UnknownProvider(_) => (StatusCode::NOT_FOUND, "not_found_error"),
            GovernorError::Config(_) | GovernorError::ConfigParsing(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "api_error"),
        };

        let suggestions = crate::providers::recovery_suggestions(&self);
        let body = json!({
            "type": "error",
            "error": {
                "type": error_type,
                "message": self.to_string(),
                "suggestions": suggestions,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, GovernorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert_eq!(GovernorError::from_status(429, "slow down").kind(), ErrorKind::RateLimited);
        assert_eq!(
            GovernorError::from_status(429, r#"{"error":{"code":"insufficient_quota"}}"#).kind(),
            ErrorKind::QuotaExceeded
        );
        assert_eq!(
            GovernorError::from_status(429, "You exceeded your current quota, please check your plan and billing details.").kind(),
            ErrorKind::QuotaExceeded
        );
        assert_eq!(GovernorError::from_status(503, "").kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(GovernorError::from_status(502, "").kind(), ErrorKind::ServiceUnavailable);
        assert_eq!(GovernorError::from_status(400, "bad").kind(), ErrorKind::Unclassified);
    }

    #[test]
    fn test_gemini_resource_exhausted_is_rate_limited() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = GovernorError::from_status(429, body);
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_retryable() {
        assert!(GovernorError::from_status(429, "").is_retryable());
        assert!(GovernorError::from_status(500, "").is_retryable());
        assert!(!GovernorError::from_status(404, "").is_retryable());
        assert!(!GovernorError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(!GovernorError::QueueCleared.is_retryable());
    }

    #[test]
    fn test_status_preserved() {
        assert_eq!(GovernorError::from_status(418, "teapot").status(), Some(418));
        assert_eq!(GovernorError::from_status(504, "").status(), Some(504));
        assert_eq!(GovernorError::QueueCleared.status(), None);
    }

    #[test]
    fn test_into_response_status_mapping() {
        let cases = vec![
            (GovernorError::Timeout(Duration::from_secs(30)), StatusCode::GATEWAY_TIMEOUT),
            (GovernorError::RateLimited("x".into()), StatusCode::TOO_MANY_REQUESTS),
            (GovernorError::QuotaExceeded("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (GovernorError::unclassified("x"), StatusCode::INTERNAL_SERVER_ERROR),
            (GovernorError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
