//! Per-provider circuit breaker (spec §4.3).
//!
//! Each provider registered with the switchboard gets its own [`CircuitBreaker`],
//! tracked in a [`CircuitBreakerRegistry`] keyed by provider name. A breaker
//! guards calls to that provider's adapter: while open, calls are rejected
//! without ever reaching the adapter.

mod circuit;
mod config;
mod error;
mod events;

pub use circuit::{CircuitMetrics, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder, SlidingWindow};
pub use error::CircuitBreakerError;
pub use events::CircuitBreakerEvent;

use std::future::Future;
use std::sync::atomic::AtomicU8;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use circuit::Circuit;
use switchboard_core::SwitchboardError;

/// Guards calls to a single provider.
pub struct CircuitBreaker {
    circuit: Mutex<Circuit>,
    state_atomic: Arc<AtomicU8>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        Self {
            circuit: Mutex::new(Circuit::new(Arc::clone(&state_atomic))),
            state_atomic,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Current state, readable without holding the circuit's lock.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(std::sync::atomic::Ordering::Acquire))
    }

    pub async fn metrics(&self) -> CircuitMetrics {
        self.circuit.lock().await.metrics(&self.config)
    }

    /// Runs `f` if the breaker permits it, classifying the outcome against
    /// `config.failure_classifier` and updating the window accordingly
    /// (spec §4.3, §4.7 step 6). Returns [`CircuitBreakerError::Open`] without
    /// invoking `f` at all when the circuit is tripped.
    pub async fn call<F, Fut, T>(&self, f: F) -> Result<T, SwitchboardError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SwitchboardError>>,
    {
        let permitted = {
            let mut circuit = self.circuit.lock().await;
            circuit.try_acquire(&self.config)
        };

        if !permitted {
            let retry_after = self.circuit.lock().await.retry_after(&self.config);
            return Err(CircuitBreakerError::Open {
                provider: self.config.name.clone(),
                retry_after,
            }
            .into());
        }

        let result = f().await;

        let mut circuit = self.circuit.lock().await;
        let is_failure = match &result {
            Ok(_) => false,
            Err(e) => (self.config.failure_classifier)(e),
        };
        if is_failure {
            circuit.record_failure(&self.config);
        } else {
            circuit.record_success(&self.config);
        }

        result
    }

    pub async fn force_open(&self) {
        self.circuit.lock().await.force_open(&self.config);
    }

    pub async fn force_closed(&self) {
        self.circuit.lock().await.force_closed(&self.config);
    }

    pub async fn reset(&self) {
        self.circuit.lock().await.reset(&self.config);
    }
}

/// One breaker per provider, created lazily on first use.
#[derive(Default)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self {
            breakers: DashMap::new(),
        }
    }

    /// Returns the breaker for `provider`, constructing one with `make_config`
    /// the first time it's seen. `make_config` typically sets `.name(provider)`.
    pub fn get_or_create(
        &self,
        provider: &str,
        make_config: impl FnOnce() -> CircuitBreakerConfig,
    ) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(provider) {
            return Arc::clone(&existing);
        }
        self.breakers
            .entry(provider.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(make_config())))
            .clone()
    }

    pub fn get(&self, provider: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(provider).map(|e| Arc::clone(&e))
    }

    pub fn remove(&self, provider: &str) {
        self.breakers.remove(provider);
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.breakers.iter().map(|e| e.key().clone()).collect()
    }
}
