use async_trait::async_trait;

use switchboard_core::{ChatMessage, Model, Request, Response, SamplingParams, SwitchboardError};

/// What a concrete AI backend must implement to be registered (spec §6.1).
///
/// Collapses the source system's parallel text/chat/embedding interfaces
/// into one trait: an adapter that can't serve a particular [`Model`] type
/// simply never advertises a model of that type from [`ProviderAdapter::models`].
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Stable provider name, used as the registry key and in every error,
    /// event, and usage record that names this provider.
    fn name(&self) -> &str;

    /// The models this provider currently exposes. Called at registration
    /// time and whenever the registry refreshes its model index; the
    /// registry assumes the result is stable between refreshes.
    fn models(&self) -> Vec<Model>;

    async fn generate_text(
        &self,
        model: &Model,
        prompt: &str,
        sampling: &SamplingParams,
    ) -> Result<Response, SwitchboardError>;

    async fn generate_chat(
        &self,
        model: &Model,
        messages: &[ChatMessage],
        sampling: &SamplingParams,
    ) -> Result<Response, SwitchboardError>;

    async fn generate_embedding(
        &self,
        model: &Model,
        inputs: &[String],
        sampling: &SamplingParams,
    ) -> Result<Response, SwitchboardError>;

    /// Lightweight liveness probe, used by `GetProviderHealth` (spec §6)
    /// independent of the circuit breaker's own call-derived state.
    async fn health_check(&self) -> Result<(), SwitchboardError> {
        Ok(())
    }
}

/// Dispatches a [`Request`] to the right `ProviderAdapter` method by payload
/// shape, so the executor doesn't need its own three-way match.
pub async fn dispatch(
    adapter: &dyn ProviderAdapter,
    model: &Model,
    request: &Request,
) -> Result<Response, SwitchboardError> {
    use switchboard_core::Payload;
    match &request.payload {
        Payload::Text { prompt } => {
            adapter
                .generate_text(model, prompt, &request.sampling)
                .await
        }
        Payload::Chat { messages } => {
            adapter
                .generate_chat(model, messages, &request.sampling)
                .await
        }
        Payload::Embedding { inputs } => {
            adapter
                .generate_embedding(model, inputs, &request.sampling)
                .await
        }
    }
}
