// Human-readable recovery hints for failed assist requests
// Author: kelexine (https://github.com/kelexine)

use crate::error::{ErrorKind, GovernorError};

/// Map an error to ordered, user-facing suggestions. Advisory only.
pub fn recovery_suggestions(error: &GovernorError) -> Vec<&'static str> {
    match error {
        GovernorError::InvalidRequest(_) | GovernorError::Json(_) => {
            return vec!["Check the request content and try again"];
        }
        GovernorError::UnknownProvider(_) => {
            return vec![
                "Choose one of the configured AI providers",
                "Omit the provider to use the default",
            ];
        }
        GovernorError::Config(_) | GovernorError::ConfigParsing(_) => {
            return vec!["Check the AI provider configuration and API keys"];
        }
        _ => {}
    }

    match error.kind() {
        ErrorKind::RateLimited => vec![
            "Too many requests; wait a moment and retry",
            "Try a different AI provider",
        ],
        ErrorKind::QuotaExceeded => vec![
            "The provider's usage quota is exhausted; check billing or plan limits",
            "Try a different AI provider",
        ],
        ErrorKind::ServiceUnavailable => vec![
            "The AI service is temporarily unavailable; retry shortly",
            "Try a different AI provider",
        ],
        ErrorKind::Timeout => vec![
            "The request timed out; try a simpler or shorter prompt",
            "Retry the request",
        ],
        ErrorKind::QueueCleared => vec!["The request was cancelled before it was sent; submit it again"],
        ErrorKind::Unclassified => match error.status() {
            Some(401) | Some(403) => vec![
                "Check that the provider API key is valid",
                "Try a different AI provider",
            ],
            Some(400) | Some(413) | Some(422) => vec![
                "The provider rejected the request; shorten or simplify the prompt",
            ],
            Some(404) => vec!["Check the configured model and endpoint"],
            _ => vec![
                "Retry the request",
                "Check your network connection and provider configuration",
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limit_suggestions() {
        let hints = recovery_suggestions(&GovernorError::from_status(429, ""));
        assert_eq!(hints.len(), 2);
        assert!(hints[0].contains("wait"));
        assert!(hints[1].contains("different AI provider"));
    }

    #[test]
    fn test_timeout_suggests_simpler_prompt() {
        let hints = recovery_suggestions(&GovernorError::Timeout(Duration::from_secs(30)));
        assert!(hints[0].contains("simpler"));
    }

    #[test]
    fn test_auth_failure() {
        let hints = recovery_suggestions(&GovernorError::from_status(401, "bad key"));
        assert!(hints[0].contains("API key"));
    }

    #[test]
    fn test_always_non_empty() {
        let errors = vec![
            GovernorError::QueueCleared,
            GovernorError::QuotaExceeded("q".into()),
            GovernorError::from_status(503, ""),
            GovernorError::unclassified("boom"),
            GovernorError::UnknownProvider("x".into()),
        ];
        for err in errors {
            assert!(!recovery_suggestions(&err).is_empty(), "{}", err);
        }
    }
}
