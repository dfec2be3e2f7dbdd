use std::sync::Arc;
use std::time::Duration;

use switchboard_circuitbreaker::CircuitBreakerConfig;
use switchboard_core::{noop_observer, EventListeners, SharedObserver};

use crate::events::ExecutorEvent;

/// Builds a provider's [`CircuitBreakerConfig`] lazily the first time that
/// provider is seen (spec §4.3: "each provider registered ... gets its own
/// CircuitBreaker").
pub type CircuitBreakerConfigFactory = dyn Fn(&str) -> CircuitBreakerConfig + Send + Sync;

/// Retry/backoff and deadline knobs for [`crate::Executor`] (spec §4.7).
pub struct ExecutorConfig {
    pub(crate) default_timeout: Duration,
    pub(crate) max_retries: u32,
    pub(crate) base_retry_delay: Duration,
    pub(crate) max_retry_delay: Duration,
    pub(crate) jitter_fraction: f64,
    pub(crate) circuit_breaker_config: Arc<CircuitBreakerConfigFactory>,
    pub(crate) observer: SharedObserver,
    pub(crate) event_listeners: EventListeners<ExecutorEvent>,
}

impl ExecutorConfig {
    pub fn builder() -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::new()
    }
}

pub struct ExecutorConfigBuilder {
    default_timeout: Duration,
    max_retries: u32,
    base_retry_delay: Duration,
    max_retry_delay: Duration,
    jitter_fraction: f64,
    circuit_breaker_config: Arc<CircuitBreakerConfigFactory>,
    observer: SharedObserver,
    event_listeners: EventListeners<ExecutorEvent>,
}

impl ExecutorConfigBuilder {
    pub fn new() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            max_retries: 3,
            base_retry_delay: Duration::from_millis(200),
            // spec §4.7 step 7: backoff "capped at 30s".
            max_retry_delay: Duration::from_secs(30),
            jitter_fraction: 0.25,
            circuit_breaker_config: Arc::new(|name: &str| {
                CircuitBreakerConfig::builder().name(name).build()
            }),
            observer: noop_observer(),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn base_retry_delay(mut self, delay: Duration) -> Self {
        self.base_retry_delay = delay;
        self
    }

    pub fn max_retry_delay(mut self, delay: Duration) -> Self {
        self.max_retry_delay = delay;
        self
    }

    /// Fraction of the computed backoff applied as uniform jitter in either
    /// direction (spec §4.7: "±25%"), the same shape as the teacher's
    /// `ExponentialRandomBackoff`.
    pub fn jitter_fraction(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction;
        self
    }

    pub fn circuit_breaker_config<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> CircuitBreakerConfig + Send + Sync + 'static,
    {
        self.circuit_breaker_config = Arc::new(factory);
        self
    }

    pub fn observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&ExecutorEvent) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(switchboard_core::FnListener::new(f));
        self
    }

    pub fn build(self) -> ExecutorConfig {
        ExecutorConfig {
            default_timeout: self.default_timeout,
            max_retries: self.max_retries,
            base_retry_delay: self.base_retry_delay,
            max_retry_delay: self.max_retry_delay,
            jitter_fraction: self.jitter_fraction,
            circuit_breaker_config: self.circuit_breaker_config,
            observer: self.observer,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for ExecutorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
