use async_trait::async_trait;
use std::time::Instant;

use switchboard_core::{
    ChatMessage, FinishReason, Model, ModelType, ResponsePayload, SamplingParams, SwitchboardError,
    TokenUsage,
};
use switchboard_registry::ProviderAdapter;

pub fn model(id: &str, input_cost: f64) -> Model {
    Model {
        id: id.to_string(),
        model_type: ModelType::Chat,
        max_tokens: 4096,
        input_cost_per_1k: input_cost,
        output_cost_per_1k: input_cost,
        capabilities: Default::default(),
        provider: String::new(),
    }
}

/// A provider adapter that always succeeds, echoing the prompt back.
pub struct FakeAdapter {
    name: String,
    models: Vec<Model>,
}

impl FakeAdapter {
    pub fn new(name: &str, models: Vec<Model>) -> Self {
        Self {
            name: name.to_string(),
            models,
        }
    }

    fn response(&self, model: &Model, content: String) -> switchboard_core::Response {
        switchboard_core::Response {
            id: "r".into(),
            model: model.id.clone(),
            provider: self.name.clone(),
            payload: ResponsePayload::Text { content },
            usage: TokenUsage::default(),
            finish_reason: Some(FinishReason::Stop),
            cost: 0.0,
            created_at: Instant::now(),
            from_cache: false,
        }
    }
}

#[async_trait]
impl ProviderAdapter for FakeAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn models(&self) -> Vec<Model> {
        self.models.clone()
    }

    async fn generate_text(
        &self,
        model: &Model,
        prompt: &str,
        _sampling: &SamplingParams,
    ) -> Result<switchboard_core::Response, SwitchboardError> {
        Ok(self.response(model, prompt.to_string()))
    }

    async fn generate_chat(
        &self,
        model: &Model,
        messages: &[ChatMessage],
        _sampling: &SamplingParams,
    ) -> Result<switchboard_core::Response, SwitchboardError> {
        let content = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        Ok(self.response(model, content))
    }

    async fn generate_embedding(
        &self,
        model: &Model,
        _inputs: &[String],
        _sampling: &SamplingParams,
    ) -> Result<switchboard_core::Response, SwitchboardError> {
        Ok(self.response(model, String::new()))
    }
}
