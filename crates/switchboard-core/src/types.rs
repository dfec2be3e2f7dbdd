//! The request/response data model (spec §3).

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Coarse classification of what an AI model does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ModelType {
    Text,
    Chat,
    Embedding,
    Image,
    Code,
}

/// A model exposed by a provider. Owned by its provider; immutable once
/// the provider is registered (spec §3 invariant: "immutable after
/// registration").
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub id: String,
    pub model_type: ModelType,
    pub max_tokens: u32,
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
    pub capabilities: HashSet<String>,
    /// Populated by the registry at registration time; every `Model`
    /// returned from a registered adapter carries the adapter's name here
    /// (spec §3 invariant).
    pub provider: String,
}

impl Model {
    pub fn cost(&self, prompt_tokens: u64, completion_tokens: u64) -> f64 {
        (prompt_tokens as f64 * self.input_cost_per_1k
            + completion_tokens as f64 * self.output_cost_per_1k)
            / 1000.0
    }
}

/// Running, monotonic usage counters for one provider.
///
/// `GetUsage` snapshots this as a plain value (spec §8: "mutating the
/// returned object MUST NOT affect subsequent snapshots") — `UsageStats` has
/// no interior mutability or shared references into the provider's live
/// counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageStats {
    pub total_requests: u64,
    pub successful: u64,
    pub failed: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub avg_latency: Duration,
    pub last_request_time: Option<Instant>,
    pub per_model: HashMap<String, ModelUsage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelUsage {
    pub requests: u64,
    pub tokens: u64,
    pub cost: f64,
}

/// Token accounting for a single completed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt: u64,
    pub completion: u64,
    pub total: u64,
}

/// A chat message, used by [`ChatRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Sampling parameters shared by all three request kinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
    pub stop: Vec<String>,
}

/// The immutable payload submitted by a caller (spec §3: "Immutable once
/// submitted").
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text { prompt: String },
    Chat { messages: Vec<ChatMessage> },
    Embedding { inputs: Vec<String> },
}

impl Payload {
    pub fn model_type(&self) -> ModelType {
        match self {
            Payload::Text { .. } => ModelType::Text,
            Payload::Chat { .. } => ModelType::Chat,
            Payload::Embedding { .. } => ModelType::Embedding,
        }
    }

    /// A rough character-count-based heuristic for the size of the prompt,
    /// used to estimate token consumption before a real count is known
    /// (spec §4.7 step 5: `estimatedTokens := max(maxTokens,
    /// heuristicPromptSize)`). Four characters per token is the commonly
    /// used rule of thumb for English text.
    pub fn heuristic_prompt_tokens(&self) -> u64 {
        let chars: usize = match self {
            Payload::Text { prompt } => prompt.len(),
            Payload::Chat { messages } => messages.iter().map(|m| m.content.len()).sum(),
            Payload::Embedding { inputs } => inputs.iter().map(|s| s.len()).sum(),
        };
        ((chars as u64) / 4).max(1)
    }
}

/// A generation request. Immutable once submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Explicit model id, or `None` to let a [`SelectionStrategy`] choose.
    pub model: Option<String>,
    /// Explicit provider name, bypassing selection entirely (spec §4.7 step 2).
    pub provider: Option<String>,
    pub payload: Payload,
    pub sampling: SamplingParams,
    pub user_id: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl Request {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            provider: None,
            payload: Payload::Text {
                prompt: prompt.into(),
            },
            sampling: SamplingParams::default(),
            user_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn chat(messages: Vec<ChatMessage>) -> Self {
        Self {
            model: None,
            provider: None,
            payload: Payload::Chat { messages },
            sampling: SamplingParams::default(),
            user_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn embedding(inputs: Vec<String>) -> Self {
        Self {
            model: None,
            provider: None,
            payload: Payload::Embedding { inputs },
            sampling: SamplingParams::default(),
            user_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.sampling.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.sampling.temperature = Some(temperature);
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn model_type(&self) -> ModelType {
        self.payload.model_type()
    }
}

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCall,
}

/// Response payload, mirroring [`Payload`]'s three shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Text { content: String },
    Chat { message: ChatMessage },
    Embedding { vectors: Vec<Vec<f32>> },
}

/// A completed generation, owned by the caller once returned (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: String,
    pub model: String,
    pub provider: String,
    pub payload: ResponsePayload,
    pub usage: TokenUsage,
    pub finish_reason: Option<FinishReason>,
    pub cost: f64,
    pub created_at: Instant,
    pub from_cache: bool,
}

/// Request priority, used only for the small closed attribute set the
/// executor and observer understand (DESIGN NOTES §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Per-call context, mutable only during the retry loop (spec §3).
///
/// Carries the small closed attribute set the core understands
/// (`request_id`, `source`, `priority`) plus an opaque pass-through bucket
/// for caller-defined metadata that the core never inspects — the "typed
/// attribute set over `HashMap<String, Box<dyn Any>>`" resolution from
/// DESIGN NOTES §9.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub source: String,
    pub priority: Priority,
    pub start_time: Instant,
    pub timeout: Duration,
    pub retry_count: u32,
    pub max_retries: u32,
    pub extra: HashMap<String, String>,
    cancel: tokio_util::sync::CancellationToken,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>, timeout: Duration, max_retries: u32) -> Self {
        Self {
            request_id: request_id.into(),
            source: "unspecified".to_string(),
            priority: Priority::default(),
            start_time: Instant::now(),
            timeout,
            retry_count: 0,
            max_retries,
            extra: HashMap::new(),
            cancel: tokio_util::sync::CancellationToken::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Remaining time before `timeout` elapses, or `Duration::ZERO` if the
    /// deadline has already passed.
    pub fn remaining(&self) -> Duration {
        self.timeout
            .checked_sub(self.start_time.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_expired(&self) -> bool {
        self.start_time.elapsed() >= self.timeout
    }

    /// A clone of the cancellation token, so callers can cancel an
    /// in-flight request from another task without holding the context.
    pub fn cancellation_token(&self) -> tokio_util::sync::CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
