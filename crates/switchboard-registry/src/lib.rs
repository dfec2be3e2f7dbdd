//! Provider registry, selection strategies, and usage accounting (spec §4.6).
//!
//! [`ProviderRegistry`] is the thread-safe map of provider name →
//! [`ProviderAdapter`] plus the model-type secondary index; [`Selector`] picks
//! among candidates when a request doesn't name a provider explicitly;
//! [`UsageTracker`] is the running per-provider counters that both feed
//! `GetUsage` and the performance-sensitive selection strategies.

mod events;
mod provider;
mod registry;
mod strategy;
mod usage;

pub use events::RegistryEvent;
pub use provider::{dispatch, ProviderAdapter};
pub use registry::ProviderRegistry;
pub use strategy::{Candidate, ProviderStats, Selector, SelectionStrategy, StatsLookup};
pub use usage::UsageTracker;
