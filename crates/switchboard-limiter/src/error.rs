use std::time::Duration;
use switchboard_core::SwitchboardError;

use crate::events::Dimension;

#[derive(Debug, Clone, thiserror::Error)]
pub enum LimiterError {
    #[error("rate limited on {dimension:?} ({key}), retry after {retry_after:?}")]
    RateLimited {
        dimension: Dimension,
        key: String,
        capacity: f64,
        retry_after: Duration,
    },

    #[error("concurrency bulkhead full ({max_concurrent} slots in use)")]
    BulkheadFull { max_concurrent: usize },
}

impl From<LimiterError> for SwitchboardError {
    fn from(err: LimiterError) -> Self {
        match err {
            LimiterError::RateLimited {
                dimension,
                capacity,
                retry_after,
                ..
            } => SwitchboardError::RateLimit {
                dimension: dimension.as_str().to_string(),
                current: capacity as u64,
                limit: capacity as u64,
                retry_after: Some(retry_after),
            },
            LimiterError::BulkheadFull { max_concurrent } => SwitchboardError::RateLimit {
                dimension: Dimension::ConcurrentSlot.as_str().to_string(),
                current: max_concurrent as u64,
                limit: max_concurrent as u64,
                retry_after: None,
            },
        }
    }
}
