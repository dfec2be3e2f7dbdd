use std::time::Instant;
use switchboard_core::SwitchboardEvent;

#[derive(Debug, Clone)]
pub enum CacheEvent {
    Hit { timestamp: Instant },
    Miss { timestamp: Instant },
    Insert { timestamp: Instant },
    Eviction { timestamp: Instant },
}

impl SwitchboardEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "cache_hit",
            CacheEvent::Miss { .. } => "cache_miss",
            CacheEvent::Insert { .. } => "cache_insert",
            CacheEvent::Eviction { .. } => "cache_eviction",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp }
            | CacheEvent::Miss { timestamp }
            | CacheEvent::Insert { timestamp }
            | CacheEvent::Eviction { timestamp } => *timestamp,
        }
    }
}
