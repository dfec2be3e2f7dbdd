use std::time::{Duration, Instant};

use switchboard_core::SwitchboardEvent;

/// Observability events emitted by [`crate::Executor::run`] (spec §4.7).
#[derive(Debug, Clone)]
pub enum ExecutorEvent {
    ProviderSelected {
        provider: String,
        model: String,
        timestamp: Instant,
    },
    CacheHit {
        provider: String,
        model: String,
        timestamp: Instant,
    },
    CacheMiss {
        provider: String,
        model: String,
        timestamp: Instant,
    },
    RetryScheduled {
        provider: String,
        attempt: u32,
        delay: Duration,
        timestamp: Instant,
    },
    Succeeded {
        provider: String,
        model: String,
        latency: Duration,
        timestamp: Instant,
    },
    Failed {
        provider: Option<String>,
        retryable: bool,
        timestamp: Instant,
    },
}

impl SwitchboardEvent for ExecutorEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExecutorEvent::ProviderSelected { .. } => "executor_provider_selected",
            ExecutorEvent::CacheHit { .. } => "executor_cache_hit",
            ExecutorEvent::CacheMiss { .. } => "executor_cache_miss",
            ExecutorEvent::RetryScheduled { .. } => "executor_retry_scheduled",
            ExecutorEvent::Succeeded { .. } => "executor_succeeded",
            ExecutorEvent::Failed { .. } => "executor_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            ExecutorEvent::ProviderSelected { timestamp, .. }
            | ExecutorEvent::CacheHit { timestamp, .. }
            | ExecutorEvent::CacheMiss { timestamp, .. }
            | ExecutorEvent::RetryScheduled { timestamp, .. }
            | ExecutorEvent::Succeeded { timestamp, .. }
            | ExecutorEvent::Failed { timestamp, .. } => *timestamp,
        }
    }
}
