use std::sync::Arc;
use std::time::Duration;

use switchboard_core::{EventListeners, Request};

use crate::events::CacheEvent;
use crate::eviction::EvictionPolicy;
use crate::key::{default_eligibility, KeyStrategy};

pub(crate) type EligibilityPredicate = dyn Fn(&Request) -> bool + Send + Sync;

pub struct CacheConfig {
    pub(crate) max_size: usize,
    pub(crate) default_ttl: Option<Duration>,
    pub(crate) min_ttl: Option<Duration>,
    pub(crate) max_ttl: Option<Duration>,
    pub(crate) eviction_policy: EvictionPolicy,
    pub(crate) key_strategy: KeyStrategy,
    pub(crate) eligibility: Arc<EligibilityPredicate>,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }

    /// The effective TTL for an entry: `default_ttl` scaled by the key
    /// strategy's factor (halved for user-specific keys) and the response's
    /// content-class factor, clamped to `[min_ttl, max_ttl]` when those
    /// bounds are configured (spec §4.5).
    pub fn effective_ttl(&self, content_multiplier: f64) -> Option<Duration> {
        let base = self.default_ttl?.as_secs_f64();
        let scaled = base * self.key_strategy.ttl_scale() * content_multiplier;
        let lo = self.min_ttl.map(|d| d.as_secs_f64()).unwrap_or(0.0);
        let hi = self.max_ttl.map(|d| d.as_secs_f64()).unwrap_or(f64::MAX);
        Some(Duration::from_secs_f64(scaled.clamp(lo, hi)))
    }
}

pub struct CacheConfigBuilder {
    max_size: usize,
    default_ttl: Option<Duration>,
    min_ttl: Option<Duration>,
    max_ttl: Option<Duration>,
    eviction_policy: EvictionPolicy,
    key_strategy: KeyStrategy,
    eligibility: Arc<EligibilityPredicate>,
    event_listeners: EventListeners<CacheEvent>,
}

impl CacheConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_size: 1000,
            default_ttl: Some(Duration::from_secs(300)),
            min_ttl: None,
            max_ttl: None,
            eviction_policy: EvictionPolicy::Lru,
            key_strategy: KeyStrategy::Standard,
            eligibility: Arc::new(default_eligibility),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    pub fn ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Bounds applied after the key-strategy and content-class multipliers
    /// are folded into the base TTL (spec §4.5: "within strategy-defined bounds").
    pub fn ttl_bounds(mut self, min: Duration, max: Duration) -> Self {
        self.min_ttl = Some(min);
        self.max_ttl = Some(max);
        self
    }

    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    pub fn key_strategy(mut self, strategy: KeyStrategy) -> Self {
        self.key_strategy = strategy;
        self
    }

    pub fn eligibility<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.eligibility = Arc::new(predicate);
        self
    }

    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(switchboard_core::FnListener::new(f));
        self
    }

    pub fn build(self) -> CacheConfig {
        CacheConfig {
            max_size: self.max_size,
            default_ttl: self.default_ttl,
            min_ttl: self.min_ttl,
            max_ttl: self.max_ttl,
            eviction_policy: self.eviction_policy,
            key_strategy: self.key_strategy,
            eligibility: self.eligibility,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
