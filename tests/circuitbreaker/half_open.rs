use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use switchboard_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState, SlidingWindow};
use switchboard_core::SwitchboardError;

fn failing_error() -> SwitchboardError {
    SwitchboardError::ServiceUnavailable {
        provider: "p".into(),
        message: "down".into(),
    }
}

async fn trip(breaker: &CircuitBreaker, failures: usize) {
    for _ in 0..failures {
        let _ = breaker
            .call(|| async { Err::<(), _>(failing_error()) })
            .await;
    }
}

/// Spec §8 property 5: while Open and before the cooldown elapses, no call
/// reaches the guarded closure at all.
#[tokio::test]
async fn fail_fast_never_invokes_the_closure_before_cooldown() {
    let breaker = CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .name("p")
            .failure_rate_threshold(0.99)
            .sliding_window_size(3)
            .minimum_number_of_calls(3)
            .wait_duration_in_open(Duration::from_millis(100))
            .build(),
    );
    trip(&breaker, 3).await;
    assert_eq!(breaker.state(), CircuitState::Open);

    let calls = Arc::new(AtomicUsize::new(0));
    for _ in 0..5 {
        let calls = Arc::clone(&calls);
        let _ = breaker
            .call(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, SwitchboardError>(())
            })
            .await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn half_open_admits_exactly_the_configured_probe_count() {
    let breaker = CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .name("p")
            .failure_rate_threshold(0.99)
            .sliding_window_size(2)
            .minimum_number_of_calls(2)
            .wait_duration_in_open(Duration::from_millis(30))
            .permitted_calls_in_half_open(2)
            .build(),
    );
    trip(&breaker, 2).await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    let calls = Arc::new(AtomicUsize::new(0));
    for _ in 0..4 {
        let calls = Arc::clone(&calls);
        let _ = breaker
            .call(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, SwitchboardError>(())
            })
            .await;
    }
    // Two probes admitted and succeeded, closing the breaker; the remaining
    // two calls then run normally since the breaker is Closed again.
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn half_open_probe_failure_reopens_immediately() {
    let breaker = CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .name("p")
            .failure_rate_threshold(0.99)
            .sliding_window_size(2)
            .minimum_number_of_calls(2)
            .wait_duration_in_open(Duration::from_millis(30))
            .build(),
    );
    trip(&breaker, 2).await;
    tokio::time::sleep(Duration::from_millis(40)).await;

    let _ = breaker
        .call(|| async { Err::<(), _>(failing_error()) })
        .await;
    assert_eq!(breaker.state(), CircuitState::Open);
}

#[tokio::test]
async fn time_based_window_forgets_failures_outside_it() {
    let breaker = CircuitBreaker::new(
        CircuitBreakerConfig::builder()
            .name("p")
            .sliding_window(SlidingWindow::TimeBased)
            .sliding_window_duration(Duration::from_millis(50))
            .failure_rate_threshold(0.99)
            .minimum_number_of_calls(2)
            .build(),
    );
    trip(&breaker, 1).await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    trip(&breaker, 1).await;

    // Each failure aged out before the next one landed, so the window never
    // saw two failures at once and the breaker never tripped.
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test]
async fn manual_overrides_bypass_the_window() {
    let breaker = CircuitBreaker::new(CircuitBreakerConfig::builder().name("p").build());
    assert_eq!(breaker.state(), CircuitState::Closed);
    breaker.force_open().await;
    assert_eq!(breaker.state(), CircuitState::Open);
    breaker.reset().await;
    assert_eq!(breaker.state(), CircuitState::Closed);
}
