use std::sync::Arc;
use std::time::Duration;
use switchboard_core::{EventListeners, SwitchboardError};

use crate::events::CircuitBreakerEvent;

/// Which kind of sliding window a [`CircuitBreakerConfig`] evaluates.
///
/// Count-based is the primary mode (spec §4.3); time-based is an optional
/// supplementary mode for breakers that care about wall-clock recency more
/// than call count, mirroring the teacher's `SlidingWindowType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlidingWindow {
    CountBased,
    TimeBased,
}

pub(crate) type FailureClassifier = dyn Fn(&SwitchboardError) -> bool + Send + Sync;

/// Configuration for one provider's circuit breaker.
pub struct CircuitBreakerConfig {
    pub(crate) failure_rate_threshold: f64,
    pub(crate) sliding_window: SlidingWindow,
    pub(crate) sliding_window_size: usize,
    pub(crate) sliding_window_duration: Option<Duration>,
    pub(crate) wait_duration_in_open: Duration,
    pub(crate) permitted_calls_in_half_open: usize,
    pub(crate) minimum_number_of_calls: usize,
    pub(crate) failure_classifier: Arc<FailureClassifier>,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
    pub(crate) name: String,
}

impl CircuitBreakerConfig {
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }
}

pub struct CircuitBreakerConfigBuilder {
    failure_rate_threshold: f64,
    sliding_window: SlidingWindow,
    sliding_window_size: usize,
    sliding_window_duration: Option<Duration>,
    wait_duration_in_open: Duration,
    permitted_calls_in_half_open: usize,
    minimum_number_of_calls: Option<usize>,
    failure_classifier: Arc<FailureClassifier>,
    event_listeners: EventListeners<CircuitBreakerEvent>,
    name: String,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self {
            // Spec §4.3 default: open at 50% failure rate.
            failure_rate_threshold: 0.5,
            sliding_window: SlidingWindow::CountBased,
            sliding_window_size: 10,
            sliding_window_duration: None,
            wait_duration_in_open: Duration::from_secs(30),
            permitted_calls_in_half_open: 3,
            minimum_number_of_calls: None,
            // `retryable()` errors reflect a transient provider problem; errors
            // such as InvalidRequest or ModelNotFound are caller mistakes and
            // should not trip the breaker.
            failure_classifier: Arc::new(|e: &SwitchboardError| e.retryable()),
            event_listeners: EventListeners::new(),
            name: String::from("<unnamed>"),
        }
    }

    pub fn failure_rate_threshold(mut self, rate: f64) -> Self {
        self.failure_rate_threshold = rate;
        self
    }

    pub fn sliding_window(mut self, window: SlidingWindow) -> Self {
        self.sliding_window = window;
        self
    }

    pub fn sliding_window_size(mut self, size: usize) -> Self {
        self.sliding_window_size = size;
        self
    }

    pub fn sliding_window_duration(mut self, duration: Duration) -> Self {
        self.sliding_window_duration = Some(duration);
        self
    }

    pub fn wait_duration_in_open(mut self, duration: Duration) -> Self {
        self.wait_duration_in_open = duration;
        self
    }

    pub fn permitted_calls_in_half_open(mut self, n: usize) -> Self {
        self.permitted_calls_in_half_open = n;
        self
    }

    pub fn minimum_number_of_calls(mut self, n: usize) -> Self {
        self.minimum_number_of_calls = Some(n);
        self
    }

    pub fn failure_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&SwitchboardError) -> bool + Send + Sync + 'static,
    {
        self.failure_classifier = Arc::new(classifier);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_event<F>(mut self, f: F) -> Self
    where
        F: Fn(&CircuitBreakerEvent) + Send + Sync + 'static,
    {
        self.event_listeners
            .add(switchboard_core::FnListener::new(f));
        self
    }

    pub fn build(self) -> CircuitBreakerConfig {
        if self.sliding_window == SlidingWindow::TimeBased && self.sliding_window_duration.is_none()
        {
            panic!("sliding_window_duration must be set when using SlidingWindow::TimeBased");
        }
        CircuitBreakerConfig {
            failure_rate_threshold: self.failure_rate_threshold,
            sliding_window: self.sliding_window,
            sliding_window_size: self.sliding_window_size,
            sliding_window_duration: self.sliding_window_duration,
            wait_duration_in_open: self.wait_duration_in_open,
            permitted_calls_in_half_open: self.permitted_calls_in_half_open,
            minimum_number_of_calls: self
                .minimum_number_of_calls
                .unwrap_or(self.sliding_window_size),
            failure_classifier: self.failure_classifier,
            event_listeners: self.event_listeners,
            name: self.name,
        }
    }
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
