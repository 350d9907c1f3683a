// Response cache - TTL-bounded, LRU-evicting store of upstream responses
// Author: kelexine (https://github.com/kelexine)

use crate::cache::key::CacheKey;
use crate::cache::models::{CacheConfig, CacheEntry, CacheStats};
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// In-memory response cache for a single provider.
///
/// Reads treat expired entries as misses and drop them on the spot, so the
/// periodic sweep is only a memory-reclamation pass.
pub struct ResponseCache<V = Value> {
    label: String,
    config: CacheConfig,
    entries: Mutex<LruCache<CacheKey, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone + Send + 'static> ResponseCache<V> {
    /// Create a new cache. `label` names the owning provider in logs and metrics.
    pub fn new(label: impl Into<String>, config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_size.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            label: label.into(),
            config,
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Look up a live entry, refreshing its recency on hit.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let expired = match entries.peek(key).map(|entry| entry.is_expired_at(now)) {
            Some(expired) => expired,
            None => {
                drop(entries);
                self.record_miss();
                return None;
            }
        };

        if expired {
            entries.pop(key);
            drop(entries);
            debug!(cache = %self.label, key = %key.short(), "Cache entry expired");
            crate::metrics::record_cache_operation(&self.label, "expire");
            self.record_miss();
            return None;
        }

        let data = entries.get(key).map(|entry| entry.data.clone());
        drop(entries);
        self.hits.fetch_add(1, Ordering::Relaxed);
        crate::metrics::record_cache_operation(&self.label, "hit");
        data
    }

    /// Insert with the configured default TTL.
    pub fn set(&self, key: CacheKey, value: V) {
        self.set_with_ttl(key, value, self.config.default_ttl());
    }

    /// Insert or overwrite. At capacity the least-recently-used entry goes first.
    pub fn set_with_ttl(&self, key: CacheKey, value: V, ttl: Duration) {
        let short = key.short().to_string();
        let evicted = {
            let mut entries = self.entries.lock();
            match entries.push(key.clone(), CacheEntry::new(value, ttl)) {
                Some((old_key, _)) if old_key != key => Some(old_key),
                _ => None,
            }
        };

        crate::metrics::record_cache_operation(&self.label, "store");
        if let Some(old_key) = evicted {
            debug!(cache = %self.label, evicted = %old_key.short(), "Evicted least recently used entry");
            crate::metrics::record_cache_operation(&self.label, "evict");
        }
        debug!(cache = %self.label, key = %short, ttl_ms = ttl.as_millis() as u64, "Cached response");
    }

    /// Purge every expired entry. Returns the number removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let expired: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        drop(entries);

        if !expired.is_empty() {
            debug!(cache = %self.label, removed = expired.len(), "Swept expired cache entries");
        }
        expired.len()
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.lock();
        let total_entries = entries.len();
        let expired_entries = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .count();
        drop(entries);

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;

        CacheStats {
            total_entries,
            valid_entries: total_entries - expired_entries,
            expired_entries,
            max_size: self.config.max_size,
            hits,
            misses,
            hit_ratio: if lookups == 0 {
                0.0
            } else {
                hits as f64 / lookups as f64
            },
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.entries.lock().clear();
        debug!(cache = %self.label, "Cache cleared");
    }

    /// Run `cleanup` every `cleanup_interval` until the returned handle is aborted.
    pub fn spawn_cleanup(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let period = cache.config.cleanup_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                cache.cleanup();
            }
        })
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        crate::metrics::record_cache_operation(&self.label, "miss");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn small_cache(max_size: usize) -> ResponseCache {
        ResponseCache::new(
            "test",
            CacheConfig {
                max_size,
                ..CacheConfig::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let cache = small_cache(10);
        let key = CacheKey::from("k1");
        cache.set_with_ttl(key.clone(), json!({"text": "a"}), Duration::from_millis(1000));

        assert_eq!(cache.get(&key), Some(json!({"text": "a"})));

        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(cache.get(&key), Some(json!({"text": "a"})));

        tokio::time::advance(Duration::from_millis(2)).await;
        assert_eq!(cache.get(&key), None);
        // Expired entry is removed on read.
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_exact_at_boundary() {
        let cache = small_cache(10);
        let key = CacheKey::from("edge");
        cache.set_with_ttl(key.clone(), json!(1), Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.get(&key), None);
    }

    #[test]
    fn test_lru_eviction_respects_access() {
        let cache = small_cache(2);
        cache.set(CacheKey::from("a"), json!("a"));
        cache.set(CacheKey::from("b"), json!("b"));

        // Touch "a" so "b" becomes least recently used.
        assert!(cache.get(&CacheKey::from("a")).is_some());
        cache.set(CacheKey::from("c"), json!("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&CacheKey::from("b")).is_none());
        assert!(cache.get(&CacheKey::from("a")).is_some());
        assert!(cache.get(&CacheKey::from("c")).is_some());
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let cache = small_cache(2);
        cache.set(CacheKey::from("a"), json!(1));
        cache.set(CacheKey::from("b"), json!(2));
        cache.set(CacheKey::from("a"), json!(3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&CacheKey::from("a")), Some(json!(3)));
        assert_eq!(cache.get(&CacheKey::from("b")), Some(json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_and_stats() {
        let cache = small_cache(10);
        cache.set_with_ttl(CacheKey::from("short"), json!(1), Duration::from_secs(1));
        cache.set_with_ttl(CacheKey::from("long"), json!(2), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(2)).await;

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.valid_entries, 1);
        assert_eq!(stats.expired_entries, 1);
        assert_eq!(stats.max_size, 10);

        assert_eq!(cache.cleanup(), 1);
        assert_eq!(cache.stats().total_entries, 1);
    }

    #[test]
    fn test_hit_ratio() {
        let cache = small_cache(10);
        cache.set(CacheKey::from("k"), json!(true));
        cache.get(&CacheKey::from("k"));
        cache.get(&CacheKey::from("missing"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_ratio - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_cleanup_task() {
        let cache = Arc::new(ResponseCache::new(
            "sweep",
            CacheConfig {
                max_size: 10,
                default_ttl_secs: 1,
                cleanup_interval_secs: 5,
            },
        ));
        cache.set(CacheKey::from("k"), json!(1));
        let handle = cache.spawn_cleanup();

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(cache.len(), 0);

        handle.abort();
    }
}
