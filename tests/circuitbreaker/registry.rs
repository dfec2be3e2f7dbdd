use std::time::Duration;

use switchboard_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState};
use switchboard_core::SwitchboardError;

fn config(name: &str) -> CircuitBreakerConfig {
    CircuitBreakerConfig::builder()
        .name(name)
        .failure_rate_threshold(0.5)
        .sliding_window_size(2)
        .minimum_number_of_calls(2)
        .wait_duration_in_open(Duration::from_millis(50))
        .build()
}

#[tokio::test]
async fn same_provider_name_reuses_the_same_breaker() {
    let registry = CircuitBreakerRegistry::new();
    let first = registry.get_or_create("openai", || config("openai"));
    let second = registry.get_or_create("openai", || config("openai"));

    let _ = first
        .call(|| async {
            Err::<(), _>(SwitchboardError::ServiceUnavailable {
                provider: "openai".into(),
                message: "down".into(),
            })
        })
        .await;
    let _ = first
        .call(|| async {
            Err::<(), _>(SwitchboardError::ServiceUnavailable {
                provider: "openai".into(),
                message: "down".into(),
            })
        })
        .await;

    assert_eq!(second.state(), CircuitState::Open);
}

#[tokio::test]
async fn distinct_providers_get_independent_breakers() {
    let registry = CircuitBreakerRegistry::new();
    let openai = registry.get_or_create("openai", || config("openai"));
    let anthropic = registry.get_or_create("anthropic", || config("anthropic"));

    for _ in 0..2 {
        let _ = openai
            .call(|| async {
                Err::<(), _>(SwitchboardError::ServiceUnavailable {
                    provider: "openai".into(),
                    message: "down".into(),
                })
            })
            .await;
    }

    assert_eq!(openai.state(), CircuitState::Open);
    assert_eq!(anthropic.state(), CircuitState::Closed);
}

#[tokio::test]
async fn removing_a_provider_drops_its_breaker_state() {
    let registry = CircuitBreakerRegistry::new();
    let breaker = registry.get_or_create("openai", || config("openai"));
    breaker.force_open().await;
    assert_eq!(breaker.state(), CircuitState::Open);

    registry.remove("openai");
    let fresh = registry.get_or_create("openai", || config("openai"));
    assert_eq!(fresh.state(), CircuitState::Closed);
}

#[tokio::test]
async fn provider_names_reports_every_registered_breaker() {
    let registry = CircuitBreakerRegistry::new();
    registry.get_or_create("openai", || config("openai"));
    registry.get_or_create("anthropic", || config("anthropic"));

    let mut names = registry.provider_names();
    names.sort();
    assert_eq!(names, vec!["anthropic".to_string(), "openai".to_string()]);
}
