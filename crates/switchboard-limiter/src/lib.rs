//! Multi-dimensional rate limiting and concurrency control (spec §4.2, §4.4).
//!
//! A [`Limiter`] guards requests through global, per-provider, and optional
//! per-user levels plus a [`tokio::sync::Semaphore`]-backed concurrency
//! bulkhead, acquired in a fixed order to avoid lock-order deadlocks. Each
//! level carries two independent lazily-refilled token buckets — one
//! counting requests, one counting estimated token volume — so a request
//! count limit and a token throughput limit can be enforced separately.
//! Rejecting a reservation partway through credits back whatever buckets it
//! already took.

mod bucket;
mod config;
mod error;
mod events;
mod limiter;
mod reservation;

pub use config::{LimiterConfig, LimiterConfigBuilder};
pub use error::LimiterError;
pub use events::{Dimension, LimiterEvent};
pub use limiter::Limiter;
pub use reservation::Reservation;
