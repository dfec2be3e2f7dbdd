//! Shared types, error taxonomy, and observability seam used by every
//! switchboard crate.
//!
//! `switchboard-core` has no opinion on rate limiting, circuit breaking,
//! caching, or provider selection — it only defines the vocabulary those
//! crates share: the request/response data model ([`types`]), the error
//! taxonomy ([`error`]), the generic event-listener machinery ([`events`]),
//! and the abstract observability sink ([`observer`]).

pub mod error;
pub mod events;
pub mod observer;
pub mod types;

pub use error::{Result, SwitchboardError};
pub use events::{EventListener, EventListeners, FnListener, SwitchboardEvent};
pub use observer::{noop_observer, Attrs, LogLevel, NoopObserver, Observer, SharedObserver, Span};
pub use types::{
    ChatMessage, FinishReason, Model, ModelType, ModelUsage, Payload, Priority, Request,
    RequestContext, Response, ResponsePayload, SamplingParams, TokenUsage, UsageStats,
};
