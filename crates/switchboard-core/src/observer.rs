//! The abstract observability sink (§6.3).
//!
//! The core never logs, counts, or traces directly against a concrete
//! backend — it calls through an `Observer`. A `tracing`/`metrics`-backed
//! implementation is provided behind feature flags for convenience, mirroring
//! how `tower-resilience-*` crates gate their own instrumentation behind
//! `tracing`/`metrics` features rather than hard-depending on them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// A running span. Dropping it does not end the span — call [`Span::end`].
/// Kept as an opaque handle so `Observer` implementations can stash
/// whatever per-span state they need (a `tracing::Span`, a start `Instant`,
/// nothing at all) without leaking that type into the executor.
pub trait Span: Send {
    fn end(self: Box<Self>);
}

/// A span that does nothing, for observers that don't track spans.
pub struct NoopSpan;
impl Span for NoopSpan {
    fn end(self: Box<Self>) {}
}

/// Severity for [`Observer::log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Structured attributes attached to spans, counters, and logs.
pub type Attrs = HashMap<&'static str, String>;

/// Abstract observability sink (§6.3).
///
/// Implementations MUST be non-blocking: a slow observer must not delay the
/// request path. The default [`NoopObserver`] and the optional
/// `tracing`-backed [`TracingObserver`] both satisfy this by construction.
pub trait Observer: Send + Sync {
    fn start_span(&self, name: &'static str, attrs: Attrs) -> Box<dyn Span>;
    fn record_counter(&self, name: &'static str, delta: i64, attrs: Attrs);
    fn record_histogram(&self, name: &'static str, value: f64, attrs: Attrs);
    fn log(&self, level: LogLevel, msg: &str, attrs: Attrs);
}

/// An `Observer` that discards everything. The default for constructors that
/// don't take one explicitly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn start_span(&self, _name: &'static str, _attrs: Attrs) -> Box<dyn Span> {
        Box::new(NoopSpan)
    }
    fn record_counter(&self, _name: &'static str, _delta: i64, _attrs: Attrs) {}
    fn record_histogram(&self, _name: &'static str, _value: f64, _attrs: Attrs) {}
    fn log(&self, _level: LogLevel, _msg: &str, _attrs: Attrs) {}
}

/// Shared handle to an `Observer`, cheap to clone and pass down into
/// subsystems that each want their own reference.
pub type SharedObserver = Arc<dyn Observer>;

pub fn noop_observer() -> SharedObserver {
    Arc::new(NoopObserver)
}

#[cfg(feature = "tracing")]
pub use tracing_observer::TracingObserver;

#[cfg(feature = "tracing")]
mod tracing_observer {
    use super::*;

    /// Observer backed by the `tracing` ecosystem (and `metrics` for
    /// counters/histograms, when that feature is also enabled).
    #[derive(Debug, Default, Clone, Copy)]
    pub struct TracingObserver;

    struct TracingSpan(tracing::Span, Instant);
    impl Span for TracingSpan {
        fn end(self: Box<Self>) {
            tracing::trace!(parent: &self.0, elapsed_ms = self.1.elapsed().as_millis() as u64, "span end");
        }
    }

    impl Observer for TracingObserver {
        fn start_span(&self, name: &'static str, attrs: Attrs) -> Box<dyn Span> {
            let span = tracing::info_span!("switchboard", name = name);
            let _enter = span.enter();
            for (k, v) in &attrs {
                tracing::trace!(key = *k, value = %v, "span attr");
            }
            drop(_enter);
            Box::new(TracingSpan(span, Instant::now()))
        }

        fn record_counter(&self, name: &'static str, delta: i64, attrs: Attrs) {
            #[cfg(feature = "metrics")]
            {
                let _ = &attrs;
                metrics::counter!(name).increment(delta.max(0) as u64);
            }
            #[cfg(not(feature = "metrics"))]
            tracing::trace!(counter = name, delta, ?attrs, "counter");
        }

        fn record_histogram(&self, name: &'static str, value: f64, attrs: Attrs) {
            #[cfg(feature = "metrics")]
            {
                let _ = &attrs;
                metrics::histogram!(name).record(value);
            }
            #[cfg(not(feature = "metrics"))]
            tracing::trace!(histogram = name, value, ?attrs, "histogram");
        }

        fn log(&self, level: LogLevel, msg: &str, attrs: Attrs) {
            match level {
                LogLevel::Trace => tracing::trace!(?attrs, "{msg}"),
                LogLevel::Debug => tracing::debug!(?attrs, "{msg}"),
                LogLevel::Info => tracing::info!(?attrs, "{msg}"),
                LogLevel::Warn => tracing::warn!(?attrs, "{msg}"),
                LogLevel::Error => tracing::error!(?attrs, "{msg}"),
            }
        }
    }
}

impl fmt::Debug for dyn Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Observer")
    }
}
