//! Event system for observability.
//!
//! Every subsystem (limiter, circuit breaker, cache, registry) emits its own
//! event type through an [`EventListeners`] collection, the same shape the
//! teacher's `tower_resilience_core::events` module uses. This crate defines
//! the generic machinery; each subsystem crate defines its own concrete
//! event enum.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Marker trait for events emitted by a switchboard subsystem.
pub trait SwitchboardEvent: Send + Sync + fmt::Debug {
    /// A short, stable name for the event kind (e.g. `"cache_hit"`).
    fn event_type(&self) -> &'static str;

    /// When the event occurred.
    fn timestamp(&self) -> Instant;
}

/// Receives events from a subsystem.
pub trait EventListener<E: SwitchboardEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// A function adapter so closures can be registered directly as listeners.
pub struct FnListener<F> {
    f: F,
}

impl<F> FnListener<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<E, F> EventListener<E> for FnListener<F>
where
    E: SwitchboardEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}

/// A collection of listeners for one event type.
///
/// Emitting is best-effort and non-blocking per §6.3: a listener that
/// panics is caught so the remaining listeners still observe the event, and
/// emitting never returns an error to the caller.
#[derive(Clone)]
pub struct EventListeners<E: SwitchboardEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: SwitchboardEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));
            if result.is_err() {
                #[cfg(feature = "tracing")]
                tracing::warn!(event_type = event.event_type(), "event listener panicked");
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: SwitchboardEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}
