use std::time::Instant;
use switchboard_core::SwitchboardEvent;

use crate::circuit::CircuitState;

/// Events emitted by a provider's circuit breaker (spec §6.3 observability seam).
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    CallPermitted {
        provider: String,
        timestamp: Instant,
        state: CircuitState,
    },
    CallRejected {
        provider: String,
        timestamp: Instant,
        retry_after: std::time::Duration,
    },
    SuccessRecorded {
        provider: String,
        timestamp: Instant,
        state: CircuitState,
    },
    FailureRecorded {
        provider: String,
        timestamp: Instant,
        state: CircuitState,
    },
    StateTransition {
        provider: String,
        timestamp: Instant,
        from: CircuitState,
        to: CircuitState,
    },
}

impl SwitchboardEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::CallPermitted { .. } => "circuitbreaker_call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "circuitbreaker_call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "circuitbreaker_success",
            CircuitBreakerEvent::FailureRecorded { .. } => "circuitbreaker_failure",
            CircuitBreakerEvent::StateTransition { .. } => "circuitbreaker_state_transition",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::SuccessRecorded { timestamp, .. }
            | CircuitBreakerEvent::FailureRecorded { timestamp, .. }
            | CircuitBreakerEvent::StateTransition { timestamp, .. } => *timestamp,
        }
    }
}
