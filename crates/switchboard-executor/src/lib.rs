//! Request executor (spec §4.7).
//!
//! [`Executor`] is the one place all four other subsystem crates meet: it
//! resolves a provider/model via [`switchboard_registry`], checks the cache,
//! reserves capacity through [`switchboard_limiter`], and calls the adapter
//! through a per-provider [`switchboard_circuitbreaker::CircuitBreaker`],
//! retrying with jittered backoff on transient failures.

mod config;
mod events;
mod executor;

pub use config::{CircuitBreakerConfigFactory, ExecutorConfig, ExecutorConfigBuilder};
pub use events::ExecutorEvent;
pub use executor::{Executor, ExecutorBuilder};
