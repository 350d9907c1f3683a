// Response cache and request fingerprint tests - public API only
// Author: kelexine (https://github.com/kelexine)

use assist_governor::cache::{CacheConfig, CacheKey, ResponseCache};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::time::Duration;

#[test]
fn test_cache_config_defaults() {
    let config = CacheConfig::default();

    assert_eq!(config.max_size, 1000);
    assert_eq!(config.default_ttl(), Duration::from_secs(3600));
    assert_eq!(config.cleanup_interval(), Duration::from_secs(300));
}

#[test]
fn test_nested_field_order_does_not_change_key() {
    let a: Value = serde_json::from_str(
        r#"{"model":"gpt","messages":[{"role":"user","content":"hi"}],"options":{"t":1,"k":2}}"#,
    )
    .unwrap();
    let b: Value = serde_json::from_str(
        r#"{"options":{"k":2,"t":1},"messages":[{"content":"hi","role":"user"}],"model":"gpt"}"#,
    )
    .unwrap();

    assert_eq!(CacheKey::for_value(&a), CacheKey::for_value(&b));
}

#[test]
fn test_message_order_changes_key() {
    let a = json!({"messages": [{"role": "user", "content": "a"}, {"role": "user", "content": "b"}]});
    let b = json!({"messages": [{"role": "user", "content": "b"}, {"role": "user", "content": "a"}]});

    assert_ne!(CacheKey::for_value(&a), CacheKey::for_value(&b));
}

#[test]
fn test_key_is_sha256_hex() {
    let key = CacheKey::for_value(&json!({"prompt": "hello"}));
    assert_eq!(key.as_str().len(), 64);
    assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_ttl() {
    let cache: ResponseCache = ResponseCache::new("openai", CacheConfig::default());
    let key = CacheKey::for_value(&json!({"prompt": "hello world"}));

    cache.set_with_ttl(key.clone(), json!({"text": "hi"}), Duration::from_secs(1));
    assert_eq!(cache.get(&key), Some(json!({"text": "hi"})));

    tokio::time::advance(Duration::from_millis(1500)).await;
    assert_eq!(cache.get(&key), None);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.total_entries, 0);
}

#[tokio::test(start_paused = true)]
async fn test_capacity_evicts_least_recently_used() {
    let cache: ResponseCache<u32> = ResponseCache::new(
        "gemini",
        CacheConfig {
            max_size: 2,
            ..CacheConfig::default()
        },
    );

    cache.set(CacheKey::from("a"), 1);
    cache.set(CacheKey::from("b"), 2);
    // Touch "a" so "b" becomes the eviction candidate.
    assert_eq!(cache.get(&CacheKey::from("a")), Some(1));
    cache.set(CacheKey::from("c"), 3);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get(&CacheKey::from("b")), None);
    assert_eq!(cache.get(&CacheKey::from("a")), Some(1));
    assert_eq!(cache.get(&CacheKey::from("c")), Some(3));
}

fn object_from(pairs: &[(String, i64)]) -> Value {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert(k.clone(), json!(v));
    }
    Value::Object(map)
}

proptest! {
    #[test]
    fn prop_key_ignores_insertion_order(
        pairs in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..12)
    ) {
        let forward: Vec<(String, i64)> = pairs.clone().into_iter().collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = json!({"prompt": "p", "options": object_from(&forward)});
        let b = json!({"options": object_from(&reversed), "prompt": "p"});
        prop_assert_eq!(CacheKey::for_value(&a), CacheKey::for_value(&b));
    }

    #[test]
    fn prop_different_prompts_differ(a in "[ -~]{0,40}", b in "[ -~]{0,40}") {
        prop_assume!(a != b);
        let ka = CacheKey::for_value(&json!({"prompt": a}));
        let kb = CacheKey::for_value(&json!({"prompt": b}));
        prop_assert_ne!(ka, kb);
    }
}
