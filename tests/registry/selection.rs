use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;

use switchboard_core::{ModelType, Request};
use switchboard_registry::{
    dispatch, Candidate, ProviderRegistry, ProviderStats, SelectionStrategy, Selector,
    UsageTracker,
};

use super::support::{model, FakeAdapter};

fn registry_with(providers: &[(&str, f64)]) -> ProviderRegistry {
    let registry = ProviderRegistry::new();
    for (name, cost) in providers {
        registry.register(Arc::new(FakeAdapter::new(name, vec![model("m", *cost)])));
    }
    registry
}

fn candidates_for(registry: &ProviderRegistry, providers: &[&str]) -> Vec<Candidate> {
    providers
        .iter()
        .map(|name| Candidate {
            provider: name.to_string(),
            model: registry.resolve(name, "m").unwrap(),
        })
        .collect()
}

/// Spec §4.6/§8: `CostOptimized` always picks the cheapest registered model
/// regardless of how many other providers are in play.
#[rstest]
#[case(&[("a", 0.01), ("b", 0.1)], "a")]
#[case(&[("a", 0.1), ("b", 0.01), ("c", 1.0)], "b")]
#[tokio::test]
async fn cost_optimized_always_wins_on_price(
    #[case] providers: &[(&str, f64)],
    #[case] expected: &str,
) {
    let registry = registry_with(providers);
    let names: Vec<&str> = providers.iter().map(|(n, _)| *n).collect();
    let candidates = candidates_for(&registry, &names);
    let selector = Selector::new(SelectionStrategy::CostOptimized);
    let no_stats = |_: &str| ProviderStats::default();
    let i = selector.select(&candidates, &no_stats).unwrap();
    assert_eq!(candidates[i].provider, expected);
}

/// Registering a provider under one name and resolving a different model id
/// fails, even once other providers are registered (spec §4.6 step 2).
#[tokio::test]
async fn resolving_an_unregistered_model_id_fails_cleanly() {
    let registry = registry_with(&[("a", 0.01)]);
    let err = registry.resolve("a", "does-not-exist").unwrap_err();
    assert!(matches!(
        err,
        switchboard_core::SwitchboardError::ModelNotFound { .. }
    ));
}

/// End-to-end: the registry resolves candidates, the selector picks one
/// based on live usage stats, and dispatch actually reaches the winning
/// adapter (not the loser).
#[tokio::test]
async fn selection_and_dispatch_reach_the_winning_provider_only() {
    let registry = registry_with(&[("flaky", 0.01), ("reliable", 0.01)]);
    let usage = UsageTracker::new();
    usage.record_success("reliable", "m", 10, 0.001, Duration::from_millis(50));
    usage.record_failure("flaky");
    usage.record_failure("flaky");
    usage.record_success("flaky", "m", 10, 0.001, Duration::from_millis(50));

    let candidates = candidates_for(&registry, &["flaky", "reliable"]);
    let selector = Selector::new(SelectionStrategy::PerformanceOptimized);
    let stats = |provider: &str| ProviderStats {
        success_rate: usage.success_rate(provider),
        avg_latency: usage.avg_latency(provider),
    };
    let i = selector.select(&candidates, &stats).unwrap();
    let winner = &candidates[i];
    assert_eq!(winner.provider, "reliable");

    let adapter = registry.get(&winner.provider).unwrap();
    let response = dispatch(adapter.as_ref(), &winner.model, &Request::text("hi"))
        .await
        .unwrap();
    assert_eq!(response.provider, "reliable");
}

#[tokio::test]
async fn filter_by_model_type_only_returns_matching_models() {
    let registry = registry_with(&[("a", 0.01)]);
    assert_eq!(registry.filter_by_model_type(ModelType::Chat).len(), 1);
    assert!(registry.filter_by_model_type(ModelType::Embedding).is_empty());
}
