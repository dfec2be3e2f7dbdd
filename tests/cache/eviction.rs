use std::time::Instant;

use switchboard_cache::{Cache, CacheBackend, CacheConfig, EvictionPolicy};
use switchboard_core::{FinishReason, Request, Response, ResponsePayload, TokenUsage};

fn response(tag: &str) -> Response {
    Response {
        id: tag.into(),
        model: "m".into(),
        provider: "p".into(),
        payload: ResponsePayload::Text {
            content: format!("hello {tag}"),
        },
        usage: TokenUsage::default(),
        finish_reason: Some(FinishReason::Stop),
        cost: 0.0,
        created_at: Instant::now(),
        from_cache: false,
    }
}

#[tokio::test]
async fn lru_evicts_the_least_recently_used_entry() {
    let cache = Cache::new(
        CacheConfig::builder()
            .max_size(2)
            .eviction_policy(EvictionPolicy::Lru)
            .build(),
    );

    let key_a = cache.key_for(&Request::text("a"), "m");
    let key_b = cache.key_for(&Request::text("b"), "m");
    let key_c = cache.key_for(&Request::text("c"), "m");

    cache.insert(key_a, response("a"), None);
    cache.insert(key_b, response("b"), None);
    // Touch `a` so `b` becomes the least recently used entry.
    assert!(cache.get(key_a).is_some());

    cache.insert(key_c, response("c"), None);

    assert!(cache.get(key_a).is_some());
    assert!(cache.get(key_b).is_none());
    assert!(cache.get(key_c).is_some());
}

#[tokio::test]
async fn fifo_evicts_the_oldest_entry_regardless_of_access() {
    let cache = Cache::new(
        CacheConfig::builder()
            .max_size(2)
            .eviction_policy(EvictionPolicy::Fifo)
            .build(),
    );

    let key_a = cache.key_for(&Request::text("a"), "m");
    let key_b = cache.key_for(&Request::text("b"), "m");
    let key_c = cache.key_for(&Request::text("c"), "m");

    cache.insert(key_a, response("a"), None);
    cache.insert(key_b, response("b"), None);
    // Even though `a` was just accessed, FIFO still evicts it first.
    assert!(cache.get(key_a).is_some());
    cache.insert(key_c, response("c"), None);

    assert!(cache.get(key_a).is_none());
    assert!(cache.get(key_b).is_some());
    assert!(cache.get(key_c).is_some());
}

#[tokio::test]
async fn lfu_evicts_the_least_frequently_used_entry() {
    let cache = Cache::new(
        CacheConfig::builder()
            .max_size(2)
            .eviction_policy(EvictionPolicy::Lfu)
            .build(),
    );

    let key_a = cache.key_for(&Request::text("a"), "m");
    let key_b = cache.key_for(&Request::text("b"), "m");
    let key_c = cache.key_for(&Request::text("c"), "m");

    cache.insert(key_a, response("a"), None);
    cache.insert(key_b, response("b"), None);
    // Access `a` repeatedly so `b` is the least frequently used entry.
    assert!(cache.get(key_a).is_some());
    assert!(cache.get(key_a).is_some());

    cache.insert(key_c, response("c"), None);

    assert!(cache.get(key_a).is_some());
    assert!(cache.get(key_b).is_none());
    assert!(cache.get(key_c).is_some());
}

#[tokio::test]
async fn clear_empties_the_cache() {
    let cache = Cache::new(CacheConfig::builder().build());
    let key = cache.key_for(&Request::text("a"), "m");
    cache.insert(key, response("a"), None);
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(cache.is_empty());
}
