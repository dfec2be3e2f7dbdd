use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;

use switchboard_core::{
    ChatMessage, FinishReason, Model, ModelType, Response, ResponsePayload, SamplingParams,
    SwitchboardError, TokenUsage,
};
use switchboard_registry::ProviderAdapter;

pub fn chat_model(id: &str, max_tokens: u32, input_cost: f64, output_cost: f64) -> Model {
    Model {
        id: id.to_string(),
        model_type: ModelType::Chat,
        max_tokens,
        input_cost_per_1k: input_cost,
        output_cost_per_1k: output_cost,
        capabilities: HashSet::new(),
        provider: String::new(),
    }
}

pub fn chat_response(
    provider: &str,
    model_id: &str,
    content: &str,
    prompt: u64,
    completion: u64,
) -> Response {
    Response {
        id: "r".into(),
        model: model_id.to_string(),
        provider: provider.to_string(),
        payload: ResponsePayload::Chat {
            message: ChatMessage {
                role: "assistant".into(),
                content: content.to_string(),
            },
        },
        usage: TokenUsage {
            prompt,
            completion,
            total: prompt + completion,
        },
        finish_reason: Some(FinishReason::Stop),
        cost: 0.0,
        created_at: Instant::now(),
        from_cache: false,
    }
}

/// Replays a fixed, queued sequence of outcomes for every `generate_*` call,
/// regardless of which payload kind drives it — enough to script a provider
/// that fails N times then recovers without a real backend. Once the queue
/// is drained the last outcome repeats.
pub struct ScriptedAdapter {
    pub name: String,
    pub models: Vec<Model>,
    outcomes: Mutex<VecDeque<Result<Response, SwitchboardError>>>,
    pub calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn new(
        name: impl Into<String>,
        models: Vec<Model>,
        outcomes: Vec<Result<Response, SwitchboardError>>,
    ) -> Self {
        Self {
            name: name.into(),
            models,
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> Result<Response, SwitchboardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.outcomes.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue
                .front()
                .cloned()
                .expect("ScriptedAdapter needs at least one outcome")
        }
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn models(&self) -> Vec<Model> {
        self.models.clone()
    }

    async fn generate_text(
        &self,
        _model: &Model,
        _prompt: &str,
        _sampling: &SamplingParams,
    ) -> Result<Response, SwitchboardError> {
        self.next()
    }

    async fn generate_chat(
        &self,
        _model: &Model,
        _messages: &[ChatMessage],
        _sampling: &SamplingParams,
    ) -> Result<Response, SwitchboardError> {
        self.next()
    }

    async fn generate_embedding(
        &self,
        _model: &Model,
        _inputs: &[String],
        _sampling: &SamplingParams,
    ) -> Result<Response, SwitchboardError> {
        self.next()
    }
}
