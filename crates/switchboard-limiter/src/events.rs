use std::time::{Duration, Instant};
use switchboard_core::SwitchboardEvent;

/// Which bucket a [`LimiterEvent`] concerns (spec §4.4): each of the
/// global/provider/user levels carries an independent request-count bucket
/// and token-volume bucket, plus the concurrency bulkhead slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    GlobalRequest,
    GlobalToken,
    ProviderRequest,
    ProviderToken,
    UserRequest,
    UserToken,
    ConcurrentSlot,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::GlobalRequest => "global_request",
            Dimension::GlobalToken => "global_token",
            Dimension::ProviderRequest => "provider_request",
            Dimension::ProviderToken => "provider_token",
            Dimension::UserRequest => "user_request",
            Dimension::UserToken => "user_token",
            Dimension::ConcurrentSlot => "concurrent_slot",
        }
    }
}

#[derive(Debug, Clone)]
pub enum LimiterEvent {
    Acquired {
        dimension: Dimension,
        key: String,
        timestamp: Instant,
    },
    Rejected {
        dimension: Dimension,
        key: String,
        retry_after: Duration,
        timestamp: Instant,
    },
    UserBucketEvicted {
        user_id: String,
        timestamp: Instant,
    },
}

impl SwitchboardEvent for LimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LimiterEvent::Acquired { .. } => "limiter_acquired",
            LimiterEvent::Rejected { .. } => "limiter_rejected",
            LimiterEvent::UserBucketEvicted { .. } => "limiter_user_bucket_evicted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            LimiterEvent::Acquired { timestamp, .. }
            | LimiterEvent::Rejected { timestamp, .. }
            | LimiterEvent::UserBucketEvicted { timestamp, .. } => *timestamp,
        }
    }
}
