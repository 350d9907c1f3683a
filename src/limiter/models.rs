//! Rate limiter configuration and statistics models.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-provider admission limits and retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Maximum dispatches in any trailing 60 seconds.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: usize,

    /// Maximum dispatches in any trailing hour.
    #[serde(default = "default_requests_per_hour")]
    pub requests_per_hour: usize,

    /// Maximum number of calls running upstream at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Retries allowed per item after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each subsequent one.
    #[serde(default = "default_base_retry_delay_ms")]
    pub base_retry_delay_ms: u64,
}

impl LimiterConfig {
    pub fn new(requests_per_minute: usize, requests_per_hour: usize, max_concurrent: usize) -> Self {
        Self {
            requests_per_minute,
            requests_per_hour,
            max_concurrent,
            ..Self::default()
        }
    }

    pub fn with_retries(mut self, max_retries: u32, base_retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_retry_delay_ms = base_retry_delay.as_millis() as u64;
        self
    }

    pub fn base_retry_delay(&self) -> Duration {
        Duration::from_millis(self.base_retry_delay_ms)
    }

    pub fn limits(&self) -> LimiterLimits {
        LimiterLimits {
            requests_per_minute: self.requests_per_minute,
            requests_per_hour: self.requests_per_hour,
            max_concurrent: self.max_concurrent,
            max_retries: self.max_retries,
        }
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            requests_per_hour: default_requests_per_hour(),
            max_concurrent: default_max_concurrent(),
            max_retries: default_max_retries(),
            base_retry_delay_ms: default_base_retry_delay_ms(),
        }
    }
}

fn default_requests_per_minute() -> usize {
    60
}

fn default_requests_per_hour() -> usize {
    3000
}

fn default_max_concurrent() -> usize {
    5
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_retry_delay_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimiterLimits {
    pub requests_per_minute: usize,
    pub requests_per_hour: usize,
    pub max_concurrent: usize,
    pub max_retries: u32,
}

/// Point-in-time snapshot of a limiter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimiterStats {
    pub queue_length: usize,
    pub concurrent_requests: usize,
    pub requests_last_minute: usize,
    pub requests_last_hour: usize,
    pub limits: LimiterLimits,
}
