//! Request orchestration for tools and raw model calls.
//!
//! A tool request runs as a chain of attempts against the provider serving
//! the tool's model. Each failed attempt is classified; retryable failures
//! park the chain for the configured delay and try again, everything else
//! ends it. Every chain runs as its own tokio task tracked by an
//! [`InFlightRegistry`], so [`RequestOrchestrator::shutdown`] can cancel
//! chains waiting out a retry delay.
//!
//! Attempts of one chain never overlap. Different chains are not serialized,
//! even for the same tool.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tcommon::{Registry, ToolId};
use tmemory::{
    ChatHistory, ChatHistoryStore, HistoryEntry, MemoryError, ObservationStore, StateKey,
    StateStore, StatisticsTracker,
};
use tprovider::{
    Completion, ImageAttachment, ModelRequest, ProviderRegistry, RequestOutcome, RetryPolicy,
};

use crate::{
    ChainHandle, ChainId, InFlightRegistry, NoopRequestHooks, OrchestratorError, RequestHooks,
    RequestState, Sleeper, TokioSleeper, ToolConfig, assemble_messages,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Retry according to the tool's policy.
    #[default]
    Retrying,
    /// Exactly one provider call, whatever its outcome.
    SingleShot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub tool: ToolId,
    pub text: String,
    pub image: Option<ImageAttachment>,
    pub mode: RequestMode,
}

impl ToolRequest {
    pub fn new(tool: impl Into<ToolId>, text: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            text: text.into(),
            image: None,
            mode: RequestMode::Retrying,
        }
    }

    pub fn with_image(mut self, image: Option<ImageAttachment>) -> Self {
        self.image = image;
        self
    }

    pub fn single_shot(mut self) -> Self {
        self.mode = RequestMode::SingleShot;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolReply {
    pub tool: ToolId,
    pub completion: Completion,
    pub attempts: u32,
    pub request_data: Option<Value>,
    pub response_data: Option<Value>,
}

impl ToolReply {
    pub fn text(&self) -> &str {
        &self.completion.text
    }
}

pub struct RequestOrchestratorBuilder {
    registry: ProviderRegistry,
    store: Arc<dyn StateStore>,
    tools: Vec<ToolConfig>,
    retry_policy: RetryPolicy,
    hooks: Arc<dyn RequestHooks>,
    sleeper: Arc<dyn Sleeper>,
}

impl RequestOrchestratorBuilder {
    pub fn tool(mut self, tool: ToolConfig) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = ToolConfig>) -> Self {
        self.tools.extend(tools);
        self
    }

    /// Policy used by tools that do not set their own retry count or delay.
    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn RequestHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn build(self) -> Result<RequestOrchestrator, OrchestratorError> {
        let mut tools = Registry::new();
        for tool in self.tools {
            tool.validate()?;
            let id = tool.id();
            if tools.insert(id.clone(), tool).is_some() {
                return Err(OrchestratorError::configuration(format!(
                    "tool '{id}' is defined more than once"
                )));
            }
        }

        Ok(RequestOrchestrator {
            inner: Arc::new(Inner {
                registry: self.registry,
                tools,
                history: ChatHistoryStore::new(self.store.clone()),
                statistics: StatisticsTracker::new(self.store.clone()),
                observations: ObservationStore::new(self.store),
                retry_policy: self.retry_policy,
                hooks: self.hooks,
                sleeper: self.sleeper,
                states: Mutex::new(HashMap::new()),
                in_flight: InFlightRegistry::new(),
            }),
        })
    }
}

#[derive(Clone)]
pub struct RequestOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    registry: ProviderRegistry,
    tools: Registry<ToolId, ToolConfig>,
    history: ChatHistoryStore,
    statistics: StatisticsTracker,
    observations: ObservationStore,
    retry_policy: RetryPolicy,
    hooks: Arc<dyn RequestHooks>,
    sleeper: Arc<dyn Sleeper>,
    states: Mutex<HashMap<StateKey, RequestState>>,
    in_flight: InFlightRegistry,
}

/// Deregisters a chain however its task ends, aborts included.
struct ReleaseOnDrop {
    inner: Arc<Inner>,
    id: ChainId,
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.inner.in_flight.release(self.id);
    }
}

impl RequestOrchestrator {
    pub fn builder(
        registry: ProviderRegistry,
        store: Arc<dyn StateStore>,
    ) -> RequestOrchestratorBuilder {
        RequestOrchestratorBuilder {
            registry,
            store,
            tools: Vec::new(),
            retry_policy: RetryPolicy::default(),
            hooks: Arc::new(NoopRequestHooks),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.inner.registry
    }

    pub fn tool(&self, tool: &ToolId) -> Option<&ToolConfig> {
        self.inner.tools.get(tool)
    }

    pub fn tool_ids(&self) -> impl Iterator<Item = &ToolId> {
        self.inner.tools.keys()
    }

    /// Runs a tool request chain to completion.
    pub async fn start_request(&self, request: ToolRequest) -> Result<ToolReply, OrchestratorError> {
        self.submit(request).wait().await
    }

    /// Spawns a tool request chain on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like `tokio::spawn`.
    pub fn submit(&self, request: ToolRequest) -> ChainHandle {
        let runtime = tokio::runtime::Handle::current();
        let id = self.inner.in_flight.next_id();
        let tool = request.tool.clone();

        let inner = Arc::clone(&self.inner);
        let tracked = self.inner.in_flight.track(id, move || {
            // Owned by the future from the start, so an abort before the first
            // poll still deregisters the chain.
            let release = ReleaseOnDrop {
                inner: Arc::clone(&inner),
                id,
            };
            runtime.spawn(async move {
                let _release = release;
                inner.run_chain(request).await
            })
        });

        match tracked {
            Some(join) => ChainHandle::new(id, join),
            None => {
                tracing::warn!(tool = %tool, "orchestrator is shut down, request rejected");
                let join = tokio::spawn(async move {
                    Err(OrchestratorError::cancelled("orchestrator is shut down"))
                });
                ChainHandle::new(id, join)
            }
        }
    }

    /// One provider call for a raw model, without history, examples or retries.
    /// Statistics are recorded under the model name.
    pub async fn start_model_request(
        &self,
        request: ModelRequest,
    ) -> Result<RequestOutcome, OrchestratorError> {
        self.inner.run_model_request(request).await
    }

    /// Resets a tool's history together with its observation slots.
    pub async fn clear_history(&self, tool: &ToolId) -> Result<(), OrchestratorError> {
        if !self.inner.tools.contains_key(tool) {
            return Err(OrchestratorError::configuration(format!(
                "unknown tool '{tool}'"
            )));
        }

        let key = StateKey::tool(tool);
        self.inner.history.clear(&key).await?;
        self.inner.set_local_state(&key, RequestState::Idle);
        tracing::info!(tool = %tool, "chat history cleared");
        Ok(())
    }

    pub async fn history(&self, tool: &ToolId) -> ChatHistory {
        self.inner.history.load(&StateKey::tool(tool)).await
    }

    pub fn state(&self, tool: &ToolId) -> RequestState {
        self.inner.local_state(&StateKey::tool(tool))
    }

    pub fn model_state(&self, model: &str) -> RequestState {
        self.inner.local_state(&StateKey::model(model))
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.len()
    }

    /// Cancels every running chain, including those parked in a retry delay.
    /// Later submissions are rejected.
    pub fn shutdown(&self) -> usize {
        let cancelled = self.inner.in_flight.cancel_all();
        tracing::info!(cancelled, "request orchestrator shut down");
        cancelled
    }
}

impl Inner {
    async fn run_chain(&self, request: ToolRequest) -> Result<ToolReply, OrchestratorError> {
        let Some(tool) = self.tools.get(&request.tool) else {
            tracing::warn!(tool = %request.tool, "request for unknown tool");
            return Err(OrchestratorError::configuration(format!(
                "unknown tool '{}'",
                request.tool
            )));
        };

        let key = StateKey::tool(&request.tool);
        let policy = match request.mode {
            RequestMode::Retrying => tool.retry_policy(&self.retry_policy),
            RequestMode::SingleShot => RetryPolicy::single_shot(),
        };

        self.transition(&key, RequestState::Start).await;

        if request.text.trim().is_empty() {
            let error = OrchestratorError::validation("request text must not be empty");
            return Err(self.fail(&key, error, 0).await);
        }

        let image = match request.image {
            Some(_) if !tool.vision => {
                tracing::warn!(tool = %request.tool, "tool has vision disabled, image dropped");
                None
            }
            image => image,
        };

        let mut attempt = 0;
        loop {
            self.observe(key.prefix(), self.observations.set_error(&key, Some("")).await);

            let provider = match self.registry.resolve_checked(&tool.model) {
                Ok(provider) => provider,
                Err(error) => {
                    tracing::warn!(
                        tool = %request.tool,
                        model = %tool.model,
                        error = %error,
                        "no usable provider for tool"
                    );
                    return Err(self.fail(&key, OrchestratorError::from(&error), attempt).await);
                }
            };

            let history = if tool.chat_history > 0 {
                self.history.load(&key).await
            } else {
                ChatHistory::default()
            };
            let messages = assemble_messages(tool, &history, &request.text, image.clone());
            let model_request = ModelRequest::new(tool.model.clone(), messages)
                .with_options(tool.options())
                .with_system_prompt(tool.system_prompt.clone());

            tracing::info!(
                tool = %request.tool,
                provider = %provider.id(),
                attempt,
                max_attempts = policy.max_attempts(),
                "starting tool request"
            );
            self.hooks.on_attempt_start(key.prefix(), provider.id(), attempt);

            let outcome = provider.request(model_request).await;
            self.record_exchange(&key, &outcome).await;

            let error = match &outcome.result {
                Ok(completion) => {
                    let completion = completion.clone();
                    self.record_success(&key, &completion).await;

                    let entry = HistoryEntry::new(
                        request.text.clone(),
                        completion.text.clone(),
                        completion.model.clone(),
                        completion.usage,
                    )
                    .with_image(image.clone());
                    if let Err(error) = self.history.append(&key, entry, tool.chat_history).await {
                        tracing::error!(tool = %request.tool, error = %error, "history append failed");
                    }

                    self.transition(&key, RequestState::Success).await;
                    self.hooks
                        .on_success(key.prefix(), &completion.model, attempt + 1, completion.usage);

                    return Ok(ToolReply {
                        tool: request.tool,
                        completion,
                        attempts: attempt + 1,
                        request_data: outcome.request_data,
                        response_data: outcome.response_data,
                    });
                }
                Err(error) => error.clone(),
            };

            self.transition(&key, RequestState::Error).await;
            let message = error.to_string();
            self.observe(
                key.prefix(),
                self.observations.set_error(&key, Some(&message)).await,
            );
            self.transition(&key, RequestState::Retry).await;

            if policy.should_retry(attempt, &error) {
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    tool = %request.tool,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "tool request failed, retry scheduled"
                );
                self.hooks
                    .on_retry_scheduled(key.prefix(), attempt, delay, &error);
                self.sleeper.sleep(delay).await;
                attempt += 1;
                continue;
            }

            let failure = OrchestratorError::from(&error).with_outcome(outcome);
            return Err(self.fail(&key, failure, attempt + 1).await);
        }
    }

    async fn run_model_request(
        &self,
        request: ModelRequest,
    ) -> Result<RequestOutcome, OrchestratorError> {
        let key = StateKey::model(&request.model);
        self.transition(&key, RequestState::Start).await;
        self.observe(key.prefix(), self.observations.set_error(&key, Some("")).await);

        if let Err(error) = request.validate() {
            return Err(self.fail(&key, OrchestratorError::from(&error), 0).await);
        }

        let provider = match self.registry.resolve_checked(&request.model) {
            Ok(provider) => provider,
            Err(error) => return Err(self.fail(&key, OrchestratorError::from(&error), 0).await),
        };

        self.hooks.on_attempt_start(key.prefix(), provider.id(), 0);
        let outcome = provider.request(request).await;
        self.record_exchange(&key, &outcome).await;

        match &outcome.result {
            Ok(completion) => {
                self.record_success(&key, completion).await;
                self.transition(&key, RequestState::Success).await;
                self.hooks
                    .on_success(key.prefix(), &completion.model, 1, completion.usage);
                Ok(outcome)
            }
            Err(error) => {
                let message = error.to_string();
                self.transition(&key, RequestState::Error).await;
                self.observe(
                    key.prefix(),
                    self.observations.set_error(&key, Some(&message)).await,
                );
                let failure = OrchestratorError::from(error).with_outcome(outcome.clone());
                Err(self.fail(&key, failure, 1).await)
            }
        }
    }

    async fn record_exchange(&self, key: &StateKey, outcome: &RequestOutcome) {
        let result = self
            .observations
            .set_exchange(
                key,
                outcome.request_data.as_ref(),
                outcome.response_data.as_ref(),
            )
            .await;
        self.observe(key.prefix(), result);
    }

    async fn record_success(&self, key: &StateKey, completion: &Completion) {
        let text = self.observations.set_text_response(key, &completion.text).await;
        self.observe(key.prefix(), text);
        let cleared = self.observations.set_error(key, None).await;
        self.observe(key.prefix(), cleared);

        if let Err(error) = self.statistics.record(key, completion.usage).await {
            tracing::warn!(
                subject = key.prefix(),
                error = %error,
                "statistics could not be updated"
            );
        }
    }

    /// Ends a chain: stores the error text, marks it failed and notifies hooks.
    async fn fail(
        &self,
        key: &StateKey,
        error: OrchestratorError,
        attempts: u32,
    ) -> OrchestratorError {
        let error = error.with_attempts(attempts);
        let recorded = match error.provider_error() {
            Some(provider_error) => provider_error.to_string(),
            None => error.message.clone(),
        };
        self.observe(
            key.prefix(),
            self.observations.set_error(key, Some(&recorded)).await,
        );
        self.transition(key, RequestState::Failed).await;

        tracing::error!(
            subject = key.prefix(),
            attempts,
            error_kind = ?error.kind,
            error = %error,
            "request failed"
        );
        self.hooks.on_failure(key.prefix(), attempts, &error);
        error
    }

    async fn transition(&self, key: &StateKey, state: RequestState) {
        self.set_local_state(key, state);
        let persisted = self
            .observations
            .set_request_state(key, state.as_str())
            .await;
        self.observe(key.prefix(), persisted);
        self.hooks.on_state_change(key.prefix(), state);
    }

    fn set_local_state(&self, key: &StateKey, state: RequestState) {
        if let Ok(mut states) = self.states.lock() {
            states.insert(key.clone(), state);
        }
    }

    fn local_state(&self, key: &StateKey) -> RequestState {
        self.states
            .lock()
            .ok()
            .and_then(|states| states.get(key).copied())
            .unwrap_or_default()
    }

    /// Observation slots never decide a request's result; write failures are
    /// only logged.
    fn observe(&self, subject: &str, result: Result<(), MemoryError>) {
        if let Err(error) = result {
            tracing::warn!(subject, error = %error, "observation slot could not be written");
        }
    }
}
