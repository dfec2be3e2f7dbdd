use std::time::Duration;
use switchboard_core::EventListeners;

use crate::events::LimiterEvent;

/// Configuration for a [`crate::Limiter`] (spec §4.2, §4.4).
///
/// Each of the global/provider/user dimensions carries two independent token
/// buckets — a request-count bucket and a token-volume bucket — acquired in
/// that order (spec §4.4: "request bucket → token bucket").
pub struct LimiterConfig {
    pub(crate) global_request_capacity: f64,
    pub(crate) global_request_rate_per_sec: f64,
    pub(crate) global_token_capacity: f64,
    pub(crate) global_token_rate_per_sec: f64,
    pub(crate) provider_request_capacity: f64,
    pub(crate) provider_request_rate_per_sec: f64,
    pub(crate) provider_token_capacity: f64,
    pub(crate) provider_token_rate_per_sec: f64,
    pub(crate) user_request_capacity: f64,
    pub(crate) user_request_rate_per_sec: f64,
    pub(crate) user_token_capacity: f64,
    pub(crate) user_token_rate_per_sec: f64,
    pub(crate) max_concurrent_calls: usize,
    pub(crate) concurrent_wait: Option<Duration>,
    /// Per-user buckets idle for longer than this are garbage collected
    /// (spec §4.4: "user limiter state MUST NOT grow unbounded").
    pub(crate) user_bucket_ttl: Duration,
    pub(crate) event_listeners: EventListeners<LimiterEvent>,
}

impl LimiterConfig {
    pub fn builder() -> LimiterConfigBuilder {
        LimiterConfigBuilder::new()
    }
}

pub struct LimiterConfigBuilder {
    global_request_capacity: f64,
    global_request_rate_per_sec: f64,
    global_token_capacity: f64,
    global_token_rate_per_sec: f64,
    provider_request_capacity: f64,
    provider_request_rate_per_sec: f64,
    provider_token_capacity: f64,
    provider_token_rate_per_sec: f64,
    user_request_capacity: f64,
    user_request_rate_per_sec: f64,
    user_token_capacity: f64,
    user_token_rate_per_sec: f64,
    max_concurrent_calls: usize,
    concurrent_wait: Option<Duration>,
    user_bucket_ttl: Duration,
    event_listeners: EventListeners<LimiterEvent>,
}

impl LimiterConfigBuilder {
    pub fn new() -> Self {
        Self {
            global_request_capacity: 1000.0,
            global_request_rate_per_sec: 1000.0,
            global_token_capacity: 100_000.0,
            global_token_rate_per_sec: 100_000.0,
            provider_request_capacity: 200.0,
            provider_request_rate_per_sec: 200.0,
            provider_token_capacity: 20_000.0,
            provider_token_rate_per_sec: 20_000.0,
            user_request_capacity: 20.0,
            user_request_rate_per_sec: 20.0,
            user_token_capacity: 2_000.0,
            user_token_rate_per_sec: 2_000.0,
            max_concurrent_calls: 100,
            concurrent_wait: None,
            user_bucket_ttl: Duration::from_secs(600),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn global_request_limit(mut self, capacity: f64, rate_per_sec: f64) -> Self {
        self.global_request_capacity = capacity;
        self.global_request_rate_per_sec = rate_per_sec;
        self
    }

    pub fn global_token_limit(mut self, capacity: f64, rate_per_sec: f64) -> Self {
        self.global_token_capacity = capacity;
        self.global_token_rate_per_sec = rate_per_sec;
        self
    }

    pub fn provider_request_limit(mut self, capacity: f64, rate_per_sec: f64) -> Self {
        self.provider_request_capacity = capacity;
        self.provider_request_rate_per_sec = rate_per_sec;
        self
    }

    pub fn provider_token_limit(mut self, capacity: f64, rate_per_sec: f64) -> Self {
        self.provider_token_capacity = capacity;
        self.provider_token_rate_per_sec = rate_per_sec;
        self
    }

    pub fn user_request_limit(mut self, capacity: f64, rate_per_sec: f64) -> Self {
        self.user_request_capacity = capacity;
        self.user_request_rate_per_sec = rate_per_sec;
        self
    }

    pub fn user_token_limit(mut self, capacity: f64, rate_per_sec: f64) -> Self {
        self.user_token_capacity = capacity;
        self.user_token_rate_per_sec = rate_per_sec;
        self
    }

    pub fn max_concurrent_calls(mut self, n: usize) -> Self {
        self.max_concurrent_calls = n;
        self
    }

    pub fn concurrent_wait(mut self, wait: Option<Duration>) -> Self {
        self.concurrent_wait = wait;
        self
    }

    pub fn user_bucket_ttl(mut self, ttl: Duration) -> Self {
        self.user_bucket_ttl = ttl;
        self
    }

    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&LimiterEvent) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(switchboard_core::FnListener::new(f));
        self
    }

    pub fn build(self) -> LimiterConfig {
        LimiterConfig {
            global_request_capacity: self.global_request_capacity,
            global_request_rate_per_sec: self.global_request_rate_per_sec,
            global_token_capacity: self.global_token_capacity,
            global_token_rate_per_sec: self.global_token_rate_per_sec,
            provider_request_capacity: self.provider_request_capacity,
            provider_request_rate_per_sec: self.provider_request_rate_per_sec,
            provider_token_capacity: self.provider_token_capacity,
            provider_token_rate_per_sec: self.provider_token_rate_per_sec,
            user_request_capacity: self.user_request_capacity,
            user_request_rate_per_sec: self.user_request_rate_per_sec,
            user_token_capacity: self.user_token_capacity,
            user_token_rate_per_sec: self.user_token_rate_per_sec,
            max_concurrent_calls: self.max_concurrent_calls,
            concurrent_wait: self.concurrent_wait,
            user_bucket_ttl: self.user_bucket_ttl,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for LimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
