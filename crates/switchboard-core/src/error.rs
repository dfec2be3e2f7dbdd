//! Error taxonomy shared by every switchboard subsystem.
//!
//! Every failure that can cross the executor boundary is a
//! [`SwitchboardError`]. Subsystem crates (limiter, circuit breaker, cache,
//! registry) define their own local error enum and convert it into this
//! taxonomy via `From`, the same way `tower-resilience-*` crates each
//! convert their local error into `ResilienceError<E>` rather than forcing
//! callers to write per-layer glue.

use std::time::Duration;

/// The tagged error variants an executor call can resolve to.
///
/// `retryable` is carried per-variant rather than derived from the
/// discriminant alone: `CircuitOpen` is retryable only once the breaker's
/// cooldown has elapsed, which the breaker itself decides before
/// constructing the error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SwitchboardError {
    /// The request failed shape/bounds validation before any provider call.
    #[error("invalid request: {message}")]
    InvalidRequest {
        message: String,
        model: Option<String>,
    },

    /// The provider rejected credentials or the caller lacks access.
    #[error("authentication failed for provider {provider}: {message}")]
    Authentication { provider: String, message: String },

    /// A rate-limit dimension rejected the reservation.
    #[error("rate limited ({dimension}): {current}/{limit}")]
    RateLimit {
        dimension: String,
        current: u64,
        limit: u64,
        retry_after: Option<Duration>,
    },

    /// The provider's usage quota (budget, not rate) has been exhausted.
    #[error("quota exceeded for provider {provider}: {message}")]
    QuotaExceeded { provider: String, message: String },

    /// No provider/model combination satisfies the request.
    #[error("model not found: provider={provider:?} model={model:?}")]
    ModelNotFound {
        provider: Option<String>,
        model: Option<String>,
    },

    /// The call did not complete before the caller's deadline.
    #[error("timeout in provider {provider:?} after {elapsed:?}")]
    Timeout {
        provider: Option<String>,
        elapsed: Duration,
    },

    /// The adapter reported a transient failure (not circuit-tripping on its own).
    #[error("provider {provider} unavailable: {message}")]
    ServiceUnavailable { provider: String, message: String },

    /// The provider's circuit breaker is open; the adapter was not invoked.
    #[error("circuit open for provider {provider}, retry after {retry_after:?}")]
    CircuitOpen {
        provider: String,
        retry_after: Duration,
    },

    /// Anything else — a bug, an adapter invariant violation, a poisoned lock.
    #[error("internal error: {message}")]
    Internal { message: String },

    /// The caller's context was cancelled; distinct from `Timeout` because no
    /// deadline necessarily expired.
    #[error("request cancelled")]
    Cancelled,
}

impl SwitchboardError {
    /// Whether the executor's retry loop should attempt this request again.
    ///
    /// Per spec §4.1: rate-limit, timeout, and transient unavailable are
    /// retryable; authentication, invalid-request, model-not-found, and
    /// quota-exceeded are not. `CircuitOpen` is only constructed once the
    /// breaker itself has decided the call is worth retrying later, so it is
    /// always considered retryable here — the breaker encodes "not yet" by
    /// simply not producing the error until cooldown elapses.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            SwitchboardError::RateLimit { .. }
                | SwitchboardError::Timeout { .. }
                | SwitchboardError::ServiceUnavailable { .. }
                | SwitchboardError::CircuitOpen { .. }
        )
    }

    /// The provider this error is attributed to, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            SwitchboardError::Authentication { provider, .. }
            | SwitchboardError::QuotaExceeded { provider, .. }
            | SwitchboardError::ServiceUnavailable { provider, .. }
            | SwitchboardError::CircuitOpen { provider, .. } => Some(provider),
            SwitchboardError::ModelNotFound { provider, .. } => provider.as_deref(),
            SwitchboardError::Timeout { provider, .. } => provider.as_deref(),
            _ => None,
        }
    }

    /// The model this error is attributed to, if any.
    pub fn model(&self) -> Option<&str> {
        match self {
            SwitchboardError::InvalidRequest { model, .. } => model.as_deref(),
            SwitchboardError::ModelNotFound { model, .. } => model.as_deref(),
            _ => None,
        }
    }

    /// Suggested wait before retrying, for rate-limit and circuit-open errors.
    pub fn suggested_retry_after(&self) -> Option<Duration> {
        match self {
            SwitchboardError::RateLimit { retry_after, .. } => *retry_after,
            SwitchboardError::CircuitOpen { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, SwitchboardError>;
