use std::sync::Arc;
use std::time::Duration;

use switchboard_limiter::{Limiter, LimiterConfig};

/// Spec §8 property 7 (lock-order): global → provider → user → concurrent
/// slot is acquired in a fixed order regardless of which provider/user a
/// caller names, so two requests contending on overlapping dimensions can
/// never deadlock each other. This can't observe lock order directly, but a
/// swarm of crossing requests finishing well inside a generous timeout is
/// strong evidence against a cycle.
#[tokio::test]
async fn many_crossing_requests_never_deadlock() {
    let limiter = Limiter::new(
        LimiterConfig::builder()
            .global_request_limit(1000.0, 1000.0)
            .global_token_limit(1000.0, 1000.0)
            .provider_request_limit(1000.0, 1000.0)
            .provider_token_limit(1000.0, 1000.0)
            .user_request_limit(1000.0, 1000.0)
            .user_token_limit(1000.0, 1000.0)
            .max_concurrent_calls(8)
            .build(),
    );

    let providers = ["a", "b", "c"];
    let users = ["u1", "u2", "u3"];

    let mut handles = Vec::new();
    for i in 0..60 {
        let limiter = Arc::clone(&limiter);
        let provider = providers[i % providers.len()];
        let user = users[(i + 1) % users.len()];
        handles.push(tokio::spawn(async move {
            limiter.reserve(provider, Some(user), 1.0).await
        }));
    }

    let result = tokio::time::timeout(Duration::from_secs(5), async {
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
    })
    .await;

    assert!(result.is_ok(), "swarm of reservations deadlocked or starved");
}
