//! Response cache configuration, entry and statistics models.

// Author: kelexine (https://github.com/kelexine)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Configuration for the response cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of resident entries before LRU eviction kicks in.
    #[serde(default = "default_max_size")]
    pub max_size: usize,
    /// Freshness window applied when `set` is called without an explicit TTL.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    /// Period of the background sweep that purges expired entries.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl Default for CacheConfig {
    /// Provides default values for cache configuration.
    ///
    /// - `max_size`: 1000
    /// - `default_ttl_secs`: 3600 (1 hour)
    /// - `cleanup_interval_secs`: 300 (5 minutes)
    fn default() -> Self {
        Self {
            max_size: default_max_size(),
            default_ttl_secs: default_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

fn default_max_size() -> usize {
    1000
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

/// A stored response. Immutable once inserted.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(data: V, ttl: Duration) -> Self {
        Self {
            data,
            stored_at: Instant::now(),
            ttl,
        }
    }

    /// An entry is logically absent from `stored_at + ttl` onwards.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) >= self.ttl
    }
}

/// Point-in-time statistics for a response cache.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub max_size: usize,
    /// Number of lookups answered from the cache.
    pub hits: u64,
    /// Number of lookups that found nothing live.
    pub misses: u64,
    pub hit_ratio: f64,
}
