use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

use switchboard_cache::CacheBackend;
use switchboard_circuitbreaker::CircuitBreakerRegistry;
use switchboard_core::{
    Model, Payload, Request, RequestContext, Response, SwitchboardError,
};
use switchboard_limiter::Limiter;
use switchboard_registry::{
    dispatch, Candidate, ProviderRegistry, ProviderStats, SelectionStrategy, Selector,
    UsageTracker,
};

use crate::config::ExecutorConfig;
use crate::events::ExecutorEvent;

/// Ties the registry, limiter, circuit breaker, and cache together into the
/// single retrying call path described in spec §4.7.
///
/// `generate_text`/`generate_chat`/`generate_embedding` are thin entry
/// points; all three share [`Executor::run`], which implements the common
/// validate → resolve → cache → reserve → call → handle-outcome loop.
pub struct Executor {
    registry: Arc<ProviderRegistry>,
    limiter: Arc<Limiter>,
    breakers: Arc<CircuitBreakerRegistry>,
    usage: Arc<UsageTracker>,
    cache: Option<Arc<dyn CacheBackend>>,
    selector: Selector,
    config: ExecutorConfig,
}

impl Executor {
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    pub async fn generate_text(
        &self,
        ctx: &mut RequestContext,
        request: Request,
    ) -> Result<Response, SwitchboardError> {
        debug_assert!(matches!(request.payload, Payload::Text { .. }));
        self.run(ctx, request).await
    }

    pub async fn generate_chat(
        &self,
        ctx: &mut RequestContext,
        request: Request,
    ) -> Result<Response, SwitchboardError> {
        debug_assert!(matches!(request.payload, Payload::Chat { .. }));
        self.run(ctx, request).await
    }

    pub async fn generate_embedding(
        &self,
        ctx: &mut RequestContext,
        request: Request,
    ) -> Result<Response, SwitchboardError> {
        debug_assert!(matches!(request.payload, Payload::Embedding { .. }));
        self.run(ctx, request).await
    }

    pub fn usage_tracker(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn circuit_breakers(&self) -> &CircuitBreakerRegistry {
        &self.breakers
    }

    /// The shared engine behind all three public operations (spec §4.7).
    async fn run(
        &self,
        ctx: &mut RequestContext,
        request: Request,
    ) -> Result<Response, SwitchboardError> {
        validate(&request)?;

        loop {
            if ctx.is_cancelled() {
                return Err(SwitchboardError::Cancelled);
            }
            if ctx.is_expired() {
                return Err(SwitchboardError::Timeout {
                    provider: None,
                    elapsed: ctx.start_time.elapsed(),
                });
            }

            let (provider_name, model) = match self.resolve_provider_and_model(&request) {
                Ok(pair) => pair,
                Err(err) => return Err(err),
            };

            self.config
                .event_listeners
                .emit(&ExecutorEvent::ProviderSelected {
                    provider: provider_name.clone(),
                    model: model.id.clone(),
                    timestamp: Instant::now(),
                });

            if let Some(cached) = self.try_cache_lookup(&request, &provider_name, &model) {
                return Ok(cached);
            }

            let estimated_tokens = request
                .sampling
                .max_tokens
                .map(|t| t as u64)
                .unwrap_or(0)
                .max(request.payload.heuristic_prompt_tokens());

            let reservation = match self
                .with_deadline(ctx, self.limiter.reserve(&provider_name, request.user_id.as_deref(), estimated_tokens as f64))
                .await
            {
                Ok(reservation) => reservation,
                Err(err) => {
                    if let Some(retry) = self.schedule_retry(ctx, &provider_name, &err).await? {
                        if retry {
                            continue;
                        }
                    }
                    self.usage.record_failure(&provider_name);
                    return Err(err);
                }
            };

            let breaker = self.breakers.get_or_create(&provider_name, || {
                (self.config.circuit_breaker_config)(&provider_name)
            });
            let adapter = match self.registry.get(&provider_name) {
                Some(adapter) => adapter,
                None => {
                    reservation.release();
                    return Err(SwitchboardError::ModelNotFound {
                        provider: Some(provider_name),
                        model: Some(model.id),
                    });
                }
            };

            let start = Instant::now();
            let call_result = self
                .with_deadline(
                    ctx,
                    breaker.call(|| dispatch(adapter.as_ref(), &model, &request)),
                )
                .await;

            match call_result {
                Ok(response) => {
                    let latency = start.elapsed();
                    let cost = model.cost(response.usage.prompt, response.usage.completion);
                    let mut response = response;
                    response.cost = cost;
                    response.from_cache = false;

                    self.usage.record_success(
                        &provider_name,
                        &model.id,
                        response.usage.total,
                        cost,
                        latency,
                    );
                    self.maybe_insert_cache(&request, &response);
                    // Reservation released only once usage/cache bookkeeping that
                    // depends on it having been held is done (spec §4.7 step 7).
                    reservation.release();

                    self.config.event_listeners.emit(&ExecutorEvent::Succeeded {
                        provider: provider_name,
                        model: model.id,
                        latency,
                        timestamp: Instant::now(),
                    });

                    return Ok(response);
                }
                Err(err) => {
                    if matches!(err, SwitchboardError::Cancelled) {
                        reservation.release();
                        self.config.event_listeners.emit(&ExecutorEvent::Failed {
                            provider: Some(provider_name),
                            retryable: false,
                            timestamp: Instant::now(),
                        });
                        return Err(err);
                    }

                    // Spec §4.7 step 7: release BEFORE sleeping the backoff.
                    reservation.release();

                    if let Some(true) = self.schedule_retry(ctx, &provider_name, &err).await? {
                        continue;
                    }

                    self.usage.record_failure(&provider_name);
                    self.config.event_listeners.emit(&ExecutorEvent::Failed {
                        provider: Some(provider_name),
                        retryable: err.retryable(),
                        timestamp: Instant::now(),
                    });
                    return Err(err);
                }
            }
        }
    }

    fn resolve_provider_and_model(
        &self,
        request: &Request,
    ) -> Result<(String, Model), SwitchboardError> {
        if let Some(provider) = &request.provider {
            let model_id =
                request
                    .model
                    .clone()
                    .ok_or_else(|| SwitchboardError::ModelNotFound {
                        provider: Some(provider.clone()),
                        model: None,
                    })?;
            let model = self.registry.resolve(provider, &model_id)?;
            validate_max_tokens(request, &model)?;
            return Ok((provider.clone(), model));
        }

        if let Some(model_id) = &request.model {
            let (provider, model) =
                self.registry
                    .find_model(model_id)
                    .ok_or_else(|| SwitchboardError::ModelNotFound {
                        provider: None,
                        model: Some(model_id.clone()),
                    })?;
            validate_max_tokens(request, &model)?;
            return Ok((provider, model));
        }

        let candidates: Vec<Candidate> = self
            .registry
            .filter_by_model_type(request.model_type())
            .into_iter()
            .filter_map(|(provider, model_id)| {
                self.registry
                    .resolve(&provider, &model_id)
                    .ok()
                    .map(|model| Candidate { provider, model })
            })
            .collect();

        if candidates.is_empty() {
            return Err(SwitchboardError::ModelNotFound {
                provider: None,
                model: None,
            });
        }

        let usage = &self.usage;
        let stats_lookup = move |provider: &str| ProviderStats {
            success_rate: usage.success_rate(provider),
            avg_latency: usage.avg_latency(provider),
        };

        let index = self
            .selector
            .select(&candidates, &stats_lookup)
            .ok_or_else(|| SwitchboardError::ModelNotFound {
                provider: None,
                model: None,
            })?;

        let chosen = candidates[index].clone();
        validate_max_tokens(request, &chosen.model)?;
        Ok((chosen.provider, chosen.model))
    }

    fn try_cache_lookup(
        &self,
        request: &Request,
        provider_name: &str,
        model: &Model,
    ) -> Option<Response> {
        let cache = self.cache.as_ref()?;
        if !cache.is_eligible(request) {
            return None;
        }
        let key = cache.key_for(request, &model.id);
        let result = cache.get(key);

        let event = if result.is_some() {
            ExecutorEvent::CacheHit {
                provider: provider_name.to_string(),
                model: model.id.clone(),
                timestamp: Instant::now(),
            }
        } else {
            ExecutorEvent::CacheMiss {
                provider: provider_name.to_string(),
                model: model.id.clone(),
                timestamp: Instant::now(),
            }
        };
        self.config.event_listeners.emit(&event);
        result
    }

    fn maybe_insert_cache(&self, request: &Request, response: &Response) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if !cache.is_eligible(request) {
            return;
        }
        let key = cache.key_for(request, &response.model);
        cache.insert(key, response.clone(), None);
    }

    /// Races `fut` against `ctx`'s deadline and cancellation token (spec §4.7
    /// step 8, §5 cancellation semantics).
    async fn with_deadline<T, F>(&self, ctx: &RequestContext, fut: F) -> Result<T, SwitchboardError>
    where
        F: Future<Output = Result<T, SwitchboardError>>,
    {
        let remaining = ctx.remaining();
        let cancel = ctx.cancellation_token();
        tokio::select! {
            result = fut => result,
            _ = tokio::time::sleep(remaining) => Err(SwitchboardError::Timeout {
                provider: None,
                elapsed: ctx.start_time.elapsed(),
            }),
            _ = cancel.cancelled() => Err(SwitchboardError::Cancelled),
        }
    }

    /// Decides whether `err` should trigger a retry, and if so sleeps the
    /// jittered backoff before returning `Ok(Some(true))`. Returns
    /// `Ok(Some(false))`/`Ok(None)` when the caller should give up and
    /// surface `err` as-is (spec §4.7 step 7).
    async fn schedule_retry(
        &self,
        ctx: &mut RequestContext,
        provider_name: &str,
        err: &SwitchboardError,
    ) -> Result<Option<bool>, SwitchboardError> {
        if !err.retryable() || ctx.retry_count >= ctx.max_retries || ctx.is_expired() {
            return Ok(Some(false));
        }

        let delay = backoff_delay(&self.config, ctx.retry_count);
        if delay >= ctx.remaining() {
            return Err(SwitchboardError::Timeout {
                provider: Some(provider_name.to_string()),
                elapsed: ctx.start_time.elapsed(),
            });
        }

        self.config
            .event_listeners
            .emit(&ExecutorEvent::RetryScheduled {
                provider: provider_name.to_string(),
                attempt: ctx.retry_count + 1,
                delay,
                timestamp: Instant::now(),
            });

        let cancel = ctx.cancellation_token();
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => return Err(SwitchboardError::Cancelled),
        }

        ctx.retry_count += 1;
        Ok(Some(true))
    }
}

fn validate(request: &Request) -> Result<(), SwitchboardError> {
    let empty = match &request.payload {
        Payload::Text { prompt } => prompt.is_empty(),
        Payload::Chat { messages } => messages.is_empty(),
        Payload::Embedding { inputs } => inputs.is_empty() || inputs.iter().all(|s| s.is_empty()),
    };
    if empty {
        return Err(SwitchboardError::InvalidRequest {
            message: "request payload is empty".to_string(),
            model: request.model.clone(),
        });
    }
    Ok(())
}

fn validate_max_tokens(request: &Request, model: &Model) -> Result<(), SwitchboardError> {
    if let Some(max_tokens) = request.sampling.max_tokens {
        if max_tokens > model.max_tokens {
            return Err(SwitchboardError::InvalidRequest {
                message: format!(
                    "max_tokens {max_tokens} exceeds model limit {}",
                    model.max_tokens
                ),
                model: Some(model.id.clone()),
            });
        }
    }
    Ok(())
}

/// `baseDelay · 2^retryCount` plus uniform `±jitter_fraction` jitter, capped
/// at `max_retry_delay` (spec §4.7 step 7), the same shape as the teacher's
/// `ExponentialRandomBackoff`.
fn backoff_delay(config: &ExecutorConfig, retry_count: u32) -> Duration {
    let base = config.base_retry_delay.as_secs_f64() * 2f64.powi(retry_count as i32);
    let span = base * config.jitter_fraction;
    let jitter = if span > 0.0 {
        rand::thread_rng().gen_range(-span..=span)
    } else {
        0.0
    };
    let with_jitter = (base + jitter).max(0.0);
    Duration::from_secs_f64(with_jitter.min(config.max_retry_delay.as_secs_f64()))
}

/// Constructs an [`Executor`] from its collaborators, defaulting any that
/// aren't supplied (spec §4.7 ambient config; DESIGN NOTES §9 "opt-in
/// convenience instance" applies to the facade, not this builder, which
/// stays fully explicit).
pub struct ExecutorBuilder {
    registry: Arc<ProviderRegistry>,
    limiter: Option<Arc<Limiter>>,
    breakers: Arc<CircuitBreakerRegistry>,
    usage: Arc<UsageTracker>,
    cache: Option<Arc<dyn CacheBackend>>,
    selector: Selector,
    config: crate::config::ExecutorConfigBuilder,
}

impl ExecutorBuilder {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ProviderRegistry::new()),
            limiter: None,
            breakers: Arc::new(CircuitBreakerRegistry::new()),
            usage: Arc::new(UsageTracker::new()),
            cache: None,
            selector: Selector::new(SelectionStrategy::RoundRobin),
            config: ExecutorConfig::builder(),
        }
    }

    pub fn registry(mut self, registry: Arc<ProviderRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn limiter(mut self, limiter: Arc<Limiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn circuit_breakers(mut self, breakers: Arc<CircuitBreakerRegistry>) -> Self {
        self.breakers = breakers;
        self
    }

    pub fn usage_tracker(mut self, usage: Arc<UsageTracker>) -> Self {
        self.usage = usage;
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheBackend>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.selector = Selector::new(strategy);
        self
    }

    pub fn config(mut self, f: impl FnOnce(crate::config::ExecutorConfigBuilder) -> crate::config::ExecutorConfigBuilder) -> Self {
        self.config = f(self.config);
        self
    }

    pub fn build(self) -> Executor {
        Executor {
            registry: self.registry,
            limiter: self
                .limiter
                .unwrap_or_else(|| Limiter::new(switchboard_limiter::LimiterConfig::builder().build())),
            breakers: self.breakers,
            usage: self.usage,
            cache: self.cache,
            selector: self.selector,
            config: self.config.build(),
        }
    }
}

impl Default for ExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
