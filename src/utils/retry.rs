// Retry classification and backoff schedule for queued upstream calls
// Author: kelexine (https://github.com/kelexine)

use backoff::ExponentialBackoff;
use std::time::Duration;

/// Upper bound on a single retry delay.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(300);

/// Create the doubling schedule used between retries of one queued item.
///
/// Jitter is disabled so the n-th retry waits exactly `base * 2^(n-1)`.
pub fn create_backoff(base: Duration) -> ExponentialBackoff {
    ExponentialBackoff {
        current_interval: base,
        initial_interval: base,
        randomization_factor: 0.0,
        multiplier: 2.0,
        max_interval: MAX_RETRY_DELAY,
        max_elapsed_time: None,
        ..Default::default()
    }
}

/// Determine if an HTTP status code is retryable
pub fn is_retryable(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoff::backoff::Backoff;

    #[test]
    fn test_backoff_is_capped() {
        let mut backoff = create_backoff(Duration::from_secs(1));
        let last = (0..20).filter_map(|_| backoff.next_backoff()).last();
        assert_eq!(last, Some(MAX_RETRY_DELAY));
    }

    #[test]
    fn test_backoff_sequence() {
        let mut backoff = create_backoff(Duration::from_millis(100));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_backoff(), Some(Duration::from_millis(400)));
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(429));
        assert!(is_retryable(500));
        assert!(is_retryable(502));
        assert!(is_retryable(503));
        assert!(!is_retryable(400));
        assert!(!is_retryable(404));
    }
}
