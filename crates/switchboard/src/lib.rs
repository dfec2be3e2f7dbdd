//! Multi-provider AI request orchestration.
//!
//! `switchboard` is a facade over five focused crates, each owning one piece
//! of the request path:
//!
//! | Crate | Responsibility |
//! |---|---|
//! | [`switchboard_core`] (as [`core`]) | Error taxonomy, request/response types, the `Observer` seam |
//! | [`switchboard_registry`] (as [`registry`]) | Provider registration, model lookup, selection strategies |
//! | [`switchboard_limiter`] (as [`limiter`]) | Global/provider/user token buckets + concurrency bulkhead |
//! | [`switchboard_circuitbreaker`] (as [`circuitbreaker`]) | Per-provider circuit breakers |
//! | [`switchboard_cache`] (as [`cache`], feature `cache`, on by default) | Response caching with content-aware TTL |
//! | [`switchboard_executor`] (as [`executor`]) | The retrying call path that ties the above together |
//!
//! Most callers don't need the individual crates at all: [`Switchboard`] is a
//! thin convenience wrapper around [`switchboard_executor::Executor`] that
//! wires sensible defaults for all of them, the way `tower_resilience::Policy`
//! composes its own sixteen independent patterns into one guarded call.
//!
//! # Quick Start
//!
//! ```no_run
//! use switchboard::{Switchboard, registry::ProviderAdapter};
//! use switchboard::core::{Request, RequestContext};
//! use std::time::Duration;
//!
//! # async fn run(adapter: std::sync::Arc<dyn ProviderAdapter>) -> Result<(), switchboard::core::SwitchboardError> {
//! let switchboard = Switchboard::builder().register(adapter).build();
//!
//! let mut ctx = RequestContext::new("req-1", Duration::from_secs(30), 3);
//! let response = switchboard
//!     .executor()
//!     .generate_text(&mut ctx, Request::text("hello"))
//!     .await?;
//! # let _ = response;
//! # Ok(())
//! # }
//! ```
//!
//! # Why one crate per subsystem?
//!
//! A caller wiring up only a registry and a circuit breaker (say, inside a
//! proxy that does its own rate limiting upstream) depends on
//! `switchboard-registry` and `switchboard-circuitbreaker` directly and pays
//! for nothing else. [`Switchboard`] is for callers who want the whole
//! pipeline with one call.
//!
//! Unlike `tower-resilience`'s sixteen independently optional patterns —
//! where a caller might reasonably run retry without a circuit breaker, or
//! a bulkhead without caching — the five switchboard subsystems are not
//! independently optional: a request executor without a registry has
//! nothing to call, and without a limiter or circuit breaker it has no
//! protection against overload or a wedged provider. Only the response
//! cache is a genuine opt-out (spec §4.5's Non-goals explicitly allow a
//! cache-less deployment), so it's the one piece gated behind a Cargo
//! feature; the rest are unconditional dependencies of this crate.

pub use switchboard_circuitbreaker as circuitbreaker;
pub use switchboard_core as core;
pub use switchboard_executor as executor;
pub use switchboard_limiter as limiter;
pub use switchboard_registry as registry;

#[cfg(feature = "cache")]
pub use switchboard_cache as cache;

use std::sync::Arc;

use switchboard_circuitbreaker::CircuitBreakerRegistry;
use switchboard_executor::{Executor, ExecutorConfigBuilder};
use switchboard_limiter::{Limiter, LimiterConfig};
use switchboard_registry::{ProviderAdapter, ProviderRegistry, SelectionStrategy, UsageTracker};

/// A fully wired orchestration pipeline: registry, limiter, circuit breaker
/// registry, optional cache, and the executor that drives them all.
///
/// This is a convenience over [`switchboard_executor::ExecutorBuilder`]
/// (DESIGN NOTES §9's "opt-in convenience instance") — nothing here can't be
/// built by hand from the subsystem crates directly.
pub struct Switchboard {
    executor: Executor,
}

impl Switchboard {
    pub fn builder() -> SwitchboardBuilder {
        SwitchboardBuilder::new()
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn registry(&self) -> &ProviderRegistry {
        self.executor.registry()
    }

    pub fn circuit_breakers(&self) -> &CircuitBreakerRegistry {
        self.executor.circuit_breakers()
    }

    pub fn usage_tracker(&self) -> &UsageTracker {
        self.executor.usage_tracker()
    }
}

/// Builds a [`Switchboard`] from registered providers and, optionally,
/// non-default limiter/cache/strategy configuration.
pub struct SwitchboardBuilder {
    registry: Arc<ProviderRegistry>,
    limiter_config: LimiterConfig,
    strategy: SelectionStrategy,
    #[cfg(feature = "cache")]
    cache: Option<switchboard_cache::CacheConfig>,
    executor_config: Box<dyn FnOnce(ExecutorConfigBuilder) -> ExecutorConfigBuilder>,
}

impl SwitchboardBuilder {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ProviderRegistry::new()),
            limiter_config: LimiterConfig::builder().build(),
            strategy: SelectionStrategy::RoundRobin,
            #[cfg(feature = "cache")]
            cache: Some(switchboard_cache::CacheConfig::builder().build()),
            executor_config: Box::new(|c| c),
        }
    }

    /// Registers a provider adapter (spec §4.6).
    pub fn register(self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.registry.register(adapter);
        self
    }

    /// Replaces the default rate-limiting configuration (spec §4.2, §4.4).
    pub fn limiter_config(mut self, config: LimiterConfig) -> Self {
        self.limiter_config = config;
        self
    }

    /// Selects the strategy used when a request names neither a provider
    /// nor a model (spec §4.6).
    pub fn strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replaces the default cache configuration, or disables caching
    /// entirely when passed `None` (spec §4.5's Non-goals allow a
    /// cache-less deployment).
    #[cfg(feature = "cache")]
    pub fn cache_config(mut self, config: Option<switchboard_cache::CacheConfig>) -> Self {
        self.cache = config;
        self
    }

    /// Tweaks retry/backoff/timeout knobs (spec §4.7).
    pub fn executor_config(
        mut self,
        f: impl FnOnce(ExecutorConfigBuilder) -> ExecutorConfigBuilder + 'static,
    ) -> Self {
        self.executor_config = Box::new(f);
        self
    }

    pub fn build(self) -> Switchboard {
        let mut builder = Executor::builder()
            .registry(self.registry)
            .limiter(Limiter::new(self.limiter_config))
            .strategy(self.strategy)
            .config(self.executor_config);

        #[cfg(feature = "cache")]
        {
            if let Some(cache_config) = self.cache {
                builder = builder.cache(Arc::new(switchboard_cache::Cache::new(cache_config)));
            }
        }

        Switchboard {
            executor: builder.build(),
        }
    }
}

impl Default for SwitchboardBuilder {
    fn default() -> Self {
        Self::new()
    }
}
