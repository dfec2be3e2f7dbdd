use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{CircuitBreakerConfig, SlidingWindow};
use crate::events::CircuitBreakerEvent;

/// Circuit breaker state (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }
}

/// Point-in-time view of a breaker's window, for `GetProviderHealth` (spec §6).
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitMetrics {
    pub state: CircuitState,
    pub total_calls: usize,
    pub failure_count: usize,
    pub failure_rate: f64,
    pub time_since_state_change: Duration,
}

#[derive(Debug, Clone)]
struct CallRecord {
    timestamp: Instant,
    is_failure: bool,
}

/// One provider's breaker state machine.
///
/// `state_atomic` mirrors `state` so callers can read the current state
/// from a health-check or metrics path without taking the circuit's lock
/// (spec §4.3: "state reads MUST NOT block concurrent call recording").
pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    last_state_change: Instant,
    failure_count: usize,
    success_count: usize,
    total_count: usize,
    call_records: VecDeque<CallRecord>,
}

impl Circuit {
    pub(crate) fn new(state_atomic: Arc<AtomicU8>) -> Self {
        Self {
            state: CircuitState::Closed,
            state_atomic,
            last_state_change: Instant::now(),
            failure_count: 0,
            success_count: 0,
            total_count: 0,
            call_records: VecDeque::new(),
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn metrics(&self, config: &CircuitBreakerConfig) -> CircuitMetrics {
        let (total, failures) = match config.sliding_window {
            SlidingWindow::CountBased => (self.total_count, self.failure_count),
            SlidingWindow::TimeBased => self.time_based_stats(),
        };
        CircuitMetrics {
            state: self.state,
            total_calls: total,
            failure_count: failures,
            failure_rate: if total > 0 {
                failures as f64 / total as f64
            } else {
                0.0
            },
            time_since_state_change: self.last_state_change.elapsed(),
        }
    }

    fn cleanup_old_records(&mut self, window: Duration) {
        let now = Instant::now();
        while let Some(record) = self.call_records.front() {
            if now.duration_since(record.timestamp) > window {
                self.call_records.pop_front();
            } else {
                break;
            }
        }
    }

    fn time_based_stats(&self) -> (usize, usize) {
        let total = self.call_records.len();
        let failures = self.call_records.iter().filter(|r| r.is_failure).count();
        (total, failures)
    }

    pub(crate) fn try_acquire(&mut self, config: &CircuitBreakerConfig) -> bool {
        match self.state {
            CircuitState::Closed => {
                config
                    .event_listeners
                    .emit(&CircuitBreakerEvent::CallPermitted {
                        provider: config.name.clone(),
                        timestamp: Instant::now(),
                        state: self.state,
                    });
                true
            }
            CircuitState::Open => {
                if self.last_state_change.elapsed() >= config.wait_duration_in_open {
                    self.transition_to(CircuitState::HalfOpen, config);
                    config
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallPermitted {
                            provider: config.name.clone(),
                            timestamp: Instant::now(),
                            state: self.state,
                        });
                    true
                } else {
                    let retry_after = config
                        .wait_duration_in_open
                        .saturating_sub(self.last_state_change.elapsed());
                    config
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallRejected {
                            provider: config.name.clone(),
                            timestamp: Instant::now(),
                            retry_after,
                        });
                    false
                }
            }
            CircuitState::HalfOpen => {
                let permitted =
                    self.success_count + self.failure_count < config.permitted_calls_in_half_open;
                if permitted {
                    config
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallPermitted {
                            provider: config.name.clone(),
                            timestamp: Instant::now(),
                            state: self.state,
                        });
                } else {
                    config
                        .event_listeners
                        .emit(&CircuitBreakerEvent::CallRejected {
                            provider: config.name.clone(),
                            timestamp: Instant::now(),
                            retry_after: Duration::ZERO,
                        });
                }
                permitted
            }
        }
    }

    /// Remaining wait time before an open circuit will next admit a probe.
    pub(crate) fn retry_after(&self, config: &CircuitBreakerConfig) -> Duration {
        config
            .wait_duration_in_open
            .saturating_sub(self.last_state_change.elapsed())
    }

    pub(crate) fn record_success(&mut self, config: &CircuitBreakerConfig) {
        match config.sliding_window {
            SlidingWindow::CountBased => {
                self.success_count += 1;
                self.total_count += 1;
            }
            SlidingWindow::TimeBased => {
                if let Some(window) = config.sliding_window_duration {
                    self.cleanup_old_records(window);
                    self.call_records.push_back(CallRecord {
                        timestamp: Instant::now(),
                        is_failure: false,
                    });
                }
            }
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::SuccessRecorded {
                provider: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            });

        #[cfg(feature = "metrics")]
        metrics::counter!("switchboard_circuitbreaker_calls_total", "provider" => config.name.clone(), "outcome" => "success").increment(1);

        match self.state {
            CircuitState::HalfOpen => {
                let successes = match config.sliding_window {
                    SlidingWindow::CountBased => self.success_count,
                    SlidingWindow::TimeBased => self.time_based_stats().0 - self.time_based_stats().1,
                };
                if successes >= config.permitted_calls_in_half_open {
                    self.transition_to(CircuitState::Closed, config);
                }
            }
            _ => self.evaluate_window(config),
        }
    }

    pub(crate) fn record_failure(&mut self, config: &CircuitBreakerConfig) {
        match config.sliding_window {
            SlidingWindow::CountBased => {
                self.failure_count += 1;
                self.total_count += 1;
            }
            SlidingWindow::TimeBased => {
                if let Some(window) = config.sliding_window_duration {
                    self.cleanup_old_records(window);
                    self.call_records.push_back(CallRecord {
                        timestamp: Instant::now(),
                        is_failure: true,
                    });
                }
            }
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::FailureRecorded {
                provider: config.name.clone(),
                timestamp: Instant::now(),
                state: self.state,
            });

        #[cfg(feature = "metrics")]
        metrics::counter!("switchboard_circuitbreaker_calls_total", "provider" => config.name.clone(), "outcome" => "failure").increment(1);

        match self.state {
            CircuitState::HalfOpen => self.transition_to(CircuitState::Open, config),
            _ => self.evaluate_window(config),
        }
    }

    pub(crate) fn force_open(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Open, config);
    }

    pub(crate) fn force_closed(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
    }

    pub(crate) fn reset(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig) {
        if self.state == state {
            return;
        }
        let from = self.state;

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                provider: config.name.clone(),
                timestamp: Instant::now(),
                from,
                to: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(provider = %config.name, ?from, to = ?state, "circuit breaker transition");

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.last_state_change = Instant::now();
        self.success_count = 0;
        self.failure_count = 0;
        self.total_count = 0;
        self.call_records.clear();
    }

    fn evaluate_window(&mut self, config: &CircuitBreakerConfig) {
        let (total, failures) = match config.sliding_window {
            SlidingWindow::CountBased => (self.total_count, self.failure_count),
            SlidingWindow::TimeBased => {
                if let Some(window) = config.sliding_window_duration {
                    self.cleanup_old_records(window);
                }
                self.time_based_stats()
            }
        };

        if total < config.minimum_number_of_calls {
            return;
        }
        if config.sliding_window == SlidingWindow::CountBased && total < config.sliding_window_size
        {
            return;
        }

        let failure_rate = failures as f64 / total as f64;
        if failure_rate >= config.failure_rate_threshold {
            self.transition_to(CircuitState::Open, config);
        }
    }
}
