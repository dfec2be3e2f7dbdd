use std::time::Duration;

use switchboard_core::SwitchboardError;
use switchboard_limiter::{Limiter, LimiterConfig};

#[tokio::test]
async fn global_bucket_caps_across_distinct_providers() {
    let limiter = Limiter::new(
        LimiterConfig::builder()
            .global_request_limit(2.0, 1.0)
            .provider_request_limit(100.0, 100.0)
            .build(),
    );

    assert!(limiter.reserve("openai", None, 1.0).await.is_ok());
    assert!(limiter.reserve("anthropic", None, 1.0).await.is_ok());
    let err = limiter.reserve("azure", None, 1.0).await.unwrap_err();
    assert!(matches!(err, SwitchboardError::RateLimit { .. }));
}

#[tokio::test]
async fn user_bucket_is_independent_of_a_sibling_users_bucket() {
    let limiter = Limiter::new(
        LimiterConfig::builder()
            .user_request_limit(1.0, 1.0)
            .provider_request_limit(100.0, 100.0)
            .build(),
    );

    assert!(limiter.reserve("p", Some("alice"), 1.0).await.is_ok());
    assert!(
        limiter.reserve("p", Some("alice"), 1.0).await.is_err(),
        "alice's bucket is exhausted"
    );
    assert!(
        limiter.reserve("p", Some("bob"), 1.0).await.is_ok(),
        "bob has his own untouched bucket"
    );
}

/// Spec §8 property 6: calling `release()` (or letting the reservation
/// drop) any number of times has the same observable effect as once — the
/// concurrency slot is freed exactly once either way.
#[tokio::test]
async fn dropping_or_releasing_a_reservation_frees_exactly_one_slot() {
    let limiter = Limiter::new(LimiterConfig::builder().max_concurrent_calls(1).build());

    let reservation = limiter.reserve("p", None, 0.0).await.unwrap();
    assert_eq!(limiter.available_concurrent_slots(), 0);
    reservation.release();
    assert_eq!(limiter.available_concurrent_slots(), 1);

    let reservation = limiter.reserve("p", None, 0.0).await.unwrap();
    assert_eq!(limiter.available_concurrent_slots(), 0);
    drop(reservation);
    assert_eq!(limiter.available_concurrent_slots(), 1);
}

/// Spec §8 boundary: `estimatedTokens = 0` still checks the request's
/// concurrency/identity dimensions, it just never starves on the token
/// dimension itself.
#[tokio::test]
async fn zero_cost_reservation_still_takes_a_concurrency_slot() {
    let limiter = Limiter::new(LimiterConfig::builder().max_concurrent_calls(3).build());
    let _r = limiter.reserve("p", None, 0.0).await.unwrap();
    assert_eq!(limiter.available_concurrent_slots(), 2);
}

/// Spec §8 boundary: `estimatedTokens = 0` bypasses the token bucket, but
/// the request bucket is still checked and still starves like any other
/// request-dimension exhaustion.
#[tokio::test]
async fn zero_cost_reservation_still_enforces_the_request_dimension() {
    let limiter = Limiter::new(
        LimiterConfig::builder()
            .provider_request_limit(1.0, 0.0)
            .build(),
    );
    assert!(limiter.reserve("p", None, 0.0).await.is_ok());
    let err = limiter.reserve("p", None, 0.0).await.unwrap_err();
    assert!(matches!(err, SwitchboardError::RateLimit { .. }));
}

#[tokio::test]
async fn concurrent_wait_grants_once_a_slot_frees_up() {
    let limiter = Limiter::new(
        LimiterConfig::builder()
            .max_concurrent_calls(1)
            .concurrent_wait(Some(Duration::from_millis(200)))
            .build(),
    );
    let first = limiter.reserve("p", None, 0.0).await.unwrap();

    let limiter_clone = std::sync::Arc::clone(&limiter);
    let waiter = tokio::spawn(async move { limiter_clone.reserve("p", None, 0.0).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    first.release();

    assert!(waiter.await.unwrap().is_ok());
}
