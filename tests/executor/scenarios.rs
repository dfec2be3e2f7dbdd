//! The six concrete end-to-end scenarios named in spec.md §8, each built
//! from the public crate surface rather than any internal shortcut.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use switchboard::Switchboard;
use switchboard_circuitbreaker::CircuitBreakerConfig;
use switchboard_core::{ChatMessage, Request, RequestContext, SwitchboardError};
use switchboard_executor::Executor;
use switchboard_limiter::{Limiter, LimiterConfig};
use switchboard_registry::{ProviderRegistry, SelectionStrategy, UsageTracker};

use super::support::{chat_model, chat_response, ScriptedAdapter};

fn chat_request(provider: &str, model: &str, max_tokens: u32) -> Request {
    Request::chat(vec![ChatMessage {
        role: "user".into(),
        content: "hi".into(),
    }])
    .with_provider(provider)
    .with_model(model)
    .with_max_tokens(max_tokens)
}

/// Scenario 1: happy path, cache hit on the second identical call.
#[tokio::test]
async fn happy_path_then_cache_hit() {
    let adapter = Arc::new(ScriptedAdapter::new(
        "P",
        vec![chat_model("m-chat", 4096, 0.001, 0.002)],
        vec![Ok(chat_response("P", "m-chat", "hello", 5, 1))],
    ));

    let switchboard = Switchboard::builder()
        .register(adapter.clone())
        .limiter_config(
            LimiterConfig::builder()
                .provider_request_limit(10.0, 10.0)
                .provider_token_limit(100_000.0, 100_000.0)
                .max_concurrent_calls(4)
                .build(),
        )
        .cache_config(Some(
            switchboard::cache::CacheConfig::builder()
                .ttl(Some(Duration::from_secs(60)))
                .build(),
        ))
        .executor_config(|c| {
            c.circuit_breaker_config(|name| {
                CircuitBreakerConfig::builder()
                    .name(name)
                    .minimum_number_of_calls(3)
                    .sliding_window_size(3)
                    .build()
            })
        })
        .build();

    let request = chat_request("P", "m-chat", 100);

    let mut ctx = RequestContext::new("r1", Duration::from_secs(1), 0);
    let response = switchboard
        .executor()
        .generate_chat(&mut ctx, request.clone())
        .await
        .unwrap();
    assert_eq!(response.provider, "P");
    assert_eq!(response.model, "m-chat");
    assert!((response.cost - 0.000_007).abs() < 1e-9);
    assert!(!response.from_cache);

    let stats = switchboard.usage_tracker().snapshot("P");
    assert_eq!(stats.total_requests, 1);
    assert_eq!(stats.successful, 1);
    assert_eq!(stats.total_tokens, 6);

    let mut ctx2 = RequestContext::new("r2", Duration::from_secs(1), 0);
    let second = switchboard
        .executor()
        .generate_chat(&mut ctx2, request)
        .await
        .unwrap();
    assert!(second.from_cache);
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);

    let stats_after_hit = switchboard.usage_tracker().snapshot("P");
    assert_eq!(stats_after_hit.total_requests, 1);
}

/// Scenario 2: a starved provider token bucket forces a retry, and both
/// concurrent callers eventually succeed with no leaked concurrency slot.
#[tokio::test]
async fn rate_limited_request_retries_and_succeeds() {
    let adapter = Arc::new(ScriptedAdapter::new(
        "P",
        vec![chat_model("m", 100, 0.0, 0.0)],
        vec![Ok(chat_response("P", "m", "ok", 1, 1))],
    ));
    let registry = Arc::new(ProviderRegistry::new());
    registry.register(adapter);

    // The request-count dimension stays generous; the token dimension is
    // sized to admit exactly one 5-token call before the second has to wait
    // out a refill.
    let limiter = Limiter::new(
        LimiterConfig::builder()
            .provider_request_limit(100.0, 100.0)
            .provider_token_limit(5.0, 50.0)
            .max_concurrent_calls(4)
            .build(),
    );

    let executor = Executor::builder()
        .registry(registry)
        .limiter(Arc::clone(&limiter))
        .config(|c| {
            c.max_retries(2)
                .base_retry_delay(Duration::from_millis(150))
                .jitter_fraction(0.0)
        })
        .build();

    let mut ctx_a = RequestContext::new("a", Duration::from_secs(2), 2);
    let mut ctx_b = RequestContext::new("b", Duration::from_secs(2), 2);
    let request = chat_request("P", "m", 5);

    let (a, b) = tokio::join!(
        executor.generate_chat(&mut ctx_a, request.clone()),
        executor.generate_chat(&mut ctx_b, request),
    );
    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(limiter.available_concurrent_slots(), 4);
}

/// Scenario 3: three consecutive failures trip the breaker; a fourth call
/// is rejected without ever reaching the adapter; after the cooldown a
/// single probe is admitted.
#[tokio::test]
async fn breaker_trips_fails_fast_then_probes() {
    let adapter = Arc::new(ScriptedAdapter::new(
        "P",
        vec![chat_model("m", 100, 0.0, 0.0)],
        vec![Err(SwitchboardError::ServiceUnavailable {
            provider: "P".into(),
            message: "down".into(),
        })],
    ));
    let registry = Arc::new(ProviderRegistry::new());
    registry.register(adapter.clone());

    let executor = Executor::builder()
        .registry(registry)
        .config(|c| {
            c.max_retries(0).circuit_breaker_config(|name| {
                CircuitBreakerConfig::builder()
                    .name(name)
                    .failure_rate_threshold(0.99)
                    .sliding_window_size(3)
                    .minimum_number_of_calls(3)
                    .wait_duration_in_open(Duration::from_millis(200))
                    .build()
            })
        })
        .build();

    let request = chat_request("P", "m", 10);

    for _ in 0..3 {
        let mut ctx = RequestContext::new("r", Duration::from_secs(1), 0);
        let err = executor
            .generate_chat(&mut ctx, request.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::ServiceUnavailable { .. }));
    }
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 3);

    let mut ctx = RequestContext::new("r4", Duration::from_secs(1), 0);
    let err = executor
        .generate_chat(&mut ctx, request.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchboardError::CircuitOpen { .. }));
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 3, "breaker must fail fast without calling the adapter");

    tokio::time::sleep(Duration::from_millis(250)).await;

    let mut ctx = RequestContext::new("probe", Duration::from_secs(1), 0);
    let err = executor
        .generate_chat(&mut ctx, request)
        .await
        .unwrap_err();
    assert!(matches!(err, SwitchboardError::ServiceUnavailable { .. }));
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 4, "the cooldown must admit exactly one probe");
}

/// Scenario 4: an unhealthy primary is skipped in favor of its fallback.
#[tokio::test]
async fn failover_skips_unhealthy_primary() {
    let registry = Arc::new(ProviderRegistry::new());
    registry.register(Arc::new(ScriptedAdapter::new(
        "A",
        vec![chat_model("a-chat", 4096, 0.0, 0.0)],
        vec![Ok(chat_response("A", "a-chat", "from a", 1, 1))],
    )));
    registry.register(Arc::new(ScriptedAdapter::new(
        "B",
        vec![chat_model("b-chat", 4096, 0.0, 0.0)],
        vec![Ok(chat_response("B", "b-chat", "from b", 1, 1))],
    )));

    let usage = Arc::new(UsageTracker::new());
    for i in 0..100 {
        if i < 50 {
            usage.record_success("A", "a-chat", 1, 0.0, Duration::from_millis(10));
        } else {
            usage.record_failure("A");
        }
    }

    let executor = Executor::builder()
        .registry(registry)
        .usage_tracker(usage)
        .strategy(SelectionStrategy::Failover(vec!["A".to_string(), "B".to_string()]))
        .build();

    let request = Request::chat(vec![ChatMessage {
        role: "user".into(),
        content: "hi".into(),
    }]);
    let mut ctx = RequestContext::new("r1", Duration::from_secs(1), 0);
    let response = executor.generate_chat(&mut ctx, request).await.unwrap();
    assert_eq!(response.provider, "B");
}

/// Scenario 5: cancelling mid-backoff surfaces `Cancelled` quickly, without
/// ever reaching the adapter.
#[tokio::test]
async fn cancellation_during_retry_backoff_is_prompt() {
    let adapter = Arc::new(ScriptedAdapter::new(
        "P",
        vec![chat_model("m", 100, 0.0, 0.0)],
        vec![Ok(chat_response("P", "m", "ok", 1, 1))],
    ));
    let registry = Arc::new(ProviderRegistry::new());
    registry.register(adapter.clone());

    let limiter = Limiter::new(
        LimiterConfig::builder()
            // Zero request-bucket capacity: every reservation attempt
            // starves on the first dimension it touches, before the token
            // bucket (sized to the 1000-token request below) ever matters.
            .provider_request_limit(0.0, 1.0)
            .build(),
    );

    let executor = Executor::builder()
        .registry(registry)
        .limiter(limiter)
        .config(|c| {
            c.max_retries(3).base_retry_delay(Duration::from_secs(2))
        })
        .build();

    let mut ctx = RequestContext::new("r1", Duration::from_secs(10), 3);
    let token = ctx.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let request = chat_request("P", "m", 1000);
    let started = std::time::Instant::now();
    let err = executor.generate_chat(&mut ctx, request).await.unwrap_err();
    assert!(started.elapsed() < Duration::from_millis(500));
    assert!(matches!(err, SwitchboardError::Cancelled));
    assert_eq!(adapter.calls.load(Ordering::SeqCst), 0, "a starved reservation must never reach the adapter");
}
