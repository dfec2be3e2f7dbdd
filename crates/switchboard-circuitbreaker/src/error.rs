use std::time::Duration;
use switchboard_core::SwitchboardError;

/// Local error for this crate; converts into [`SwitchboardError::CircuitOpen`]
/// at the boundary, the same pattern the teacher's subsystem crates use for
/// their own local error enums.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CircuitBreakerError {
    #[error("circuit open for provider {provider}, retry after {retry_after:?}")]
    Open {
        provider: String,
        retry_after: Duration,
    },
}

impl From<CircuitBreakerError> for SwitchboardError {
    fn from(err: CircuitBreakerError) -> Self {
        match err {
            CircuitBreakerError::Open {
                provider,
                retry_after,
            } => SwitchboardError::CircuitOpen {
                provider,
                retry_after,
            },
        }
    }
}
