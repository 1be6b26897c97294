//! Runtime wiring: credentials, transport, providers, state and hooks.

use std::sync::Arc;

use tchat::{RequestHooks, RequestOrchestrator};
use tmemory::{StateStore, create_state_store};
use tobserve::{
    FanoutRequestHooks, MetricsObservabilityHooks, SafeRequestHooks, TracingObservabilityHooks,
};
use tprovider::{HttpTransport, ProviderRegistry, SecureCredentialManager};

use crate::control::{self, ControlCommand, ControlReply};
use crate::{ToolboxConfig, ToolboxError};

#[derive(Clone)]
pub struct ToolboxRuntime {
    orchestrator: RequestOrchestrator,
    credentials: Arc<SecureCredentialManager>,
    store: Arc<dyn StateStore>,
}

impl ToolboxRuntime {
    /// Builds the runtime with a reqwest transport and the configured store.
    #[cfg(feature = "reqwest-transport")]
    pub fn from_config(config: &ToolboxConfig) -> Result<Self, ToolboxError> {
        let timeout = config.request_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| ToolboxError::config(format!("http client: {error}")))?;
        let transport = Arc::new(tprovider::ReqwestTransport::new(client).with_timeout(timeout));
        let store = create_state_store(config.state.clone())?;

        Self::from_config_with(config, transport, store)
    }

    pub fn from_config_with(
        config: &ToolboxConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn StateStore>,
    ) -> Result<Self, ToolboxError> {
        let credentials = credentials_from_config(config)?;
        let registry = provider_registry(config, Arc::clone(&credentials), transport);

        let orchestrator = RequestOrchestrator::builder(registry, Arc::clone(&store))
            .tools(config.tools.iter().cloned())
            .retry_policy(config.retry_policy())
            .hooks(default_hooks())
            .build()?;

        tracing::info!(
            tools = orchestrator.tool_ids().count(),
            models = config.model_configs().len(),
            "toolbox runtime ready"
        );

        Ok(Self {
            orchestrator,
            credentials,
            store,
        })
    }

    pub fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }

    pub fn credentials(&self) -> &Arc<SecureCredentialManager> {
        &self.credentials
    }

    pub fn store(&self) -> Arc<dyn StateStore> {
        Arc::clone(&self.store)
    }

    pub async fn handle(&self, command: ControlCommand) -> ControlReply {
        control::dispatch(&self.orchestrator, command).await
    }

    /// Cancels pending chains; returns how many were running.
    pub fn shutdown(&self) -> usize {
        self.orchestrator.shutdown()
    }
}

/// Loads every non-blank credential. Missing keys are not an error here;
/// requests to that family fail with a configuration error instead.
pub fn credentials_from_config(
    config: &ToolboxConfig,
) -> Result<Arc<SecureCredentialManager>, ToolboxError> {
    let credentials = Arc::new(SecureCredentialManager::new());

    if let Some(key) = present(&config.anthropic_api_key) {
        credentials.set_api_key(tprovider::ProviderId::Anthropic, key)?;
    }
    if let Some(key) = present(&config.openai_api_key) {
        credentials.set_api_key(tprovider::ProviderId::OpenAi, key)?;
    }
    if let Some(key) = present(&config.perplexity_api_key) {
        credentials.set_api_key(tprovider::ProviderId::Perplexity, key)?;
    }
    if let Some(key) = present(&config.openrouter_api_key) {
        credentials.set_api_key(tprovider::ProviderId::OpenRouter, key)?;
    }
    if let Some(url) = present(&config.custom_api_url) {
        credentials.set_endpoint(tprovider::ProviderId::Custom, url)?;
        if let Some(key) = present(&config.custom_api_key) {
            credentials.set_api_key(tprovider::ProviderId::Custom, key)?;
        }
    }

    Ok(credentials)
}

/// Registers every compiled-in provider family and the configured model tables.
pub fn provider_registry(
    config: &ToolboxConfig,
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn HttpTransport>,
) -> ProviderRegistry {
    #[allow(unused_mut)]
    let mut registry = ProviderRegistry::new().with_models(config.model_configs());

    #[cfg(feature = "provider-anthropic")]
    registry.register(tprovider::adapters::anthropic::AnthropicProvider::new(
        Arc::clone(&credentials),
        Arc::clone(&transport),
    ));
    #[cfg(feature = "provider-openai")]
    registry.register(
        tprovider::adapters::chat_completions::ChatCompletionsProvider::openai(
            Arc::clone(&credentials),
            Arc::clone(&transport),
        ),
    );
    #[cfg(feature = "provider-custom")]
    registry.register(
        tprovider::adapters::chat_completions::ChatCompletionsProvider::custom(
            Arc::clone(&credentials),
            Arc::clone(&transport),
        ),
    );
    #[cfg(feature = "provider-perplexity")]
    registry.register(
        tprovider::adapters::chat_completions::ChatCompletionsProvider::perplexity(
            Arc::clone(&credentials),
            Arc::clone(&transport),
        ),
    );
    #[cfg(feature = "provider-openrouter")]
    registry.register(
        tprovider::adapters::chat_completions::ChatCompletionsProvider::openrouter(
            Arc::clone(&credentials),
            Arc::clone(&transport),
        ),
    );

    let _ = (credentials, transport);
    registry
}

/// Tracing and metrics, each isolated so a panicking sink cannot break a chain.
pub fn default_hooks() -> Arc<dyn RequestHooks> {
    Arc::new(
        FanoutRequestHooks::new()
            .with(Arc::new(SafeRequestHooks::new(TracingObservabilityHooks)))
            .with(Arc::new(SafeRequestHooks::new(MetricsObservabilityHooks))),
    )
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tmemory::InMemoryStateStore;
    use tprovider::{HttpReply, HttpRequest, HttpTransport, ProviderError, ProviderFuture, ProviderId};

    use super::{ToolboxRuntime, credentials_from_config};
    use crate::ToolboxConfig;

    #[derive(Debug)]
    struct RefusingTransport;

    impl HttpTransport for RefusingTransport {
        fn post_json<'a>(
            &'a self,
            _request: HttpRequest,
        ) -> ProviderFuture<'a, Result<HttpReply, ProviderError>> {
            Box::pin(async { Err(ProviderError::transport("offline")) })
        }
    }

    #[test]
    fn credentials_skip_blank_values() {
        let config = ToolboxConfig {
            openai_api_key: Some("sk-live".to_string()),
            anthropic_api_key: Some("   ".to_string()),
            custom_api_key: Some("ignored-without-url".to_string()),
            ..ToolboxConfig::default()
        };

        let credentials = credentials_from_config(&config).expect("credentials");
        assert!(credentials.has_api_key(ProviderId::OpenAi).expect("lookup"));
        assert!(!credentials.has_api_key(ProviderId::Anthropic).expect("lookup"));
        assert!(!credentials.has_api_key(ProviderId::Custom).expect("lookup"));
    }

    #[test]
    fn runtime_registers_compiled_providers_and_models() {
        let config = ToolboxConfig::from_json_str(
            r#"{
                "tools": [{"name": "Helper", "model": "gpt-4o"}],
                "openai_models": [{"name": "gpt-4o"}],
                "custom_api_url": "http://localhost:1234/v1/chat/completions"
            }"#,
        )
        .expect("config");

        let runtime = ToolboxRuntime::from_config_with(
            &config,
            Arc::new(RefusingTransport),
            Arc::new(InMemoryStateStore::new()),
        )
        .expect("runtime should build");

        let registry = runtime.orchestrator().registry();
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.family_for("gpt-4o"), Some(ProviderId::OpenAi));
        assert_eq!(
            runtime
                .credentials()
                .endpoint(ProviderId::Custom)
                .expect("lookup")
                .as_deref(),
            Some("http://localhost:1234/v1/chat/completions")
        );
    }

    #[test]
    fn invalid_tools_fail_the_build() {
        let config = ToolboxConfig::from_json_str(
            r#"{"tools": [{"name": "Broken", "model": "gpt-4o", "max_tokens": 0}]}"#,
        )
        .expect("config");

        let error = ToolboxRuntime::from_config_with(
            &config,
            Arc::new(RefusingTransport),
            Arc::new(InMemoryStateStore::new()),
        )
        .err()
        .expect("invalid tool should fail");
        assert_eq!(error.kind, crate::ToolboxErrorKind::Orchestrator);
    }
}
