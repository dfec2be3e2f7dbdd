use std::time::{Duration, Instant};

use switchboard_cache::{Cache, CacheBackend, CacheConfig};
use switchboard_core::{FinishReason, Request, Response, ResponsePayload, TokenUsage};

fn text_response(content: &str) -> Response {
    Response {
        id: "r".into(),
        model: "m".into(),
        provider: "p".into(),
        payload: ResponsePayload::Text {
            content: content.into(),
        },
        usage: TokenUsage::default(),
        finish_reason: Some(FinishReason::Stop),
        cost: 0.0,
        created_at: Instant::now(),
        from_cache: false,
    }
}

/// Spec §8 scenario 6: a high-temperature (non-deterministic) request is
/// never cached at all, a low-temperature request is cached at the base TTL,
/// and a factual-sounding response earns the ×2 content-class extension.
#[tokio::test]
async fn cache_eligibility_follows_temperature_and_content_class() {
    let cache = Cache::new(
        CacheConfig::builder()
            .ttl(Some(Duration::from_millis(30)))
            .build(),
    );

    let creative = Request::text("write me a poem").with_temperature(0.9);
    assert!(!cache.is_eligible(&creative));

    let factual = Request::text("what is the capital of France").with_temperature(0.1);
    assert!(cache.is_eligible(&factual));
    let key = cache.key_for(&factual, "m");
    cache.insert(key, text_response("Paris is the capital of France."), None);

    // Base TTL 30ms * 2.0 (factual) = 60ms: still live well past the base TTL.
    tokio::time::sleep(Duration::from_millis(45)).await;
    let hit = cache.get(key);
    assert!(hit.is_some());
    assert!(hit.unwrap().from_cache);

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(cache.get(key).is_none());
}

#[tokio::test]
async fn metadata_flag_opts_a_request_out_of_caching() {
    let cache = Cache::new(CacheConfig::builder().build());
    let mut req = Request::text("hi");
    req.metadata.insert("no_cache".into(), "true".into());
    assert!(!cache.is_eligible(&req));
}

#[tokio::test]
async fn user_specific_strategy_halves_effective_ttl() {
    use switchboard_cache::KeyStrategy;

    let cache = Cache::new(
        CacheConfig::builder()
            .ttl(Some(Duration::from_millis(40)))
            .key_strategy(KeyStrategy::UserSpecific)
            .build(),
    );
    let req = Request::text("hi").with_user_id("alice");
    let key = cache.key_for(&req, "m");
    cache.insert(key, text_response("hello there"), None);

    // 40ms * 0.5 (user-specific) * 1.0 (neutral content) = 20ms.
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(cache.get(key).is_none());
}
