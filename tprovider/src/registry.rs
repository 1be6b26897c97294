//! Provider registry mapping model names to the family configured to serve them.
//!
//! ```rust
//! use tprovider::{ModelConfig, ProviderId, ProviderRegistry};
//!
//! let mut registry = ProviderRegistry::new();
//! registry.add_model(ModelConfig::active(ProviderId::OpenRouter, "gpt-4o"));
//! registry.add_model(ModelConfig::active(ProviderId::OpenAi, "gpt-4o"));
//!
//! // No providers registered yet, so nothing resolves.
//! assert!(registry.resolve("gpt-4o").is_none());
//! assert_eq!(registry.family_for("gpt-4o"), Some(ProviderId::OpenAi));
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tcommon::Registry;

use crate::{ModelProvider, ProviderError, ProviderId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: ProviderId,
    pub model: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl ModelConfig {
    pub fn new(provider: ProviderId, model: impl Into<String>, active: bool) -> Self {
        Self {
            provider,
            model: model.into(),
            active,
        }
    }

    pub fn active(provider: ProviderId, model: impl Into<String>) -> Self {
        Self::new(provider, model, true)
    }
}

/// Entry of the model picker list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelChoice {
    pub label: String,
    pub value: String,
}

#[derive(Default)]
pub struct ProviderRegistry {
    providers: Registry<ProviderId, Arc<dyn ModelProvider>>,
    models: Vec<ModelConfig>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<P>(&mut self, provider: P)
    where
        P: ModelProvider + 'static,
    {
        self.providers.insert(provider.id(), Arc::new(provider));
    }

    pub fn register_shared(&mut self, provider: Arc<dyn ModelProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn get(&self, provider_id: ProviderId) -> Option<Arc<dyn ModelProvider>> {
        self.providers.get(&provider_id).cloned()
    }

    pub fn contains(&self, provider_id: ProviderId) -> bool {
        self.providers.contains_key(&provider_id)
    }

    pub fn add_model(&mut self, model: ModelConfig) {
        self.models.push(model);
    }

    pub fn with_models(mut self, models: impl IntoIterator<Item = ModelConfig>) -> Self {
        self.models.extend(models);
        self
    }

    pub fn models(&self) -> &[ModelConfig] {
        &self.models
    }

    /// First family, in precedence order, listing `model` as active.
    pub fn family_for(&self, model: &str) -> Option<ProviderId> {
        ProviderId::PRECEDENCE.into_iter().find(|family| {
            self.models
                .iter()
                .any(|entry| entry.provider == *family && entry.active && entry.model == model)
        })
    }

    /// Resolves the provider for `model` without looking at credentials.
    pub fn resolve_family(&self, model: &str) -> Result<Arc<dyn ModelProvider>, ProviderError> {
        let family = self.family_for(model).ok_or_else(|| {
            ProviderError::configuration(format!("no active model configuration for {model:?}"))
        })?;

        self.get(family).ok_or_else(|| {
            ProviderError::configuration(format!(
                "model {model:?} belongs to {family} but no {family} provider is registered"
            ))
        })
    }

    /// Resolves the provider for `model`, requiring its credential to be set.
    pub fn resolve_checked(&self, model: &str) -> Result<Arc<dyn ModelProvider>, ProviderError> {
        let provider = self.resolve_family(model)?;
        if !provider.check_credential() {
            return Err(ProviderError::configuration(format!(
                "{} credential is not configured",
                provider.id()
            )));
        }

        Ok(provider)
    }

    pub fn resolve(&self, model: &str) -> Option<Arc<dyn ModelProvider>> {
        match self.resolve_checked(model) {
            Ok(provider) => Some(provider),
            Err(error) => {
                tracing::warn!(
                    phase = "provider",
                    event = "resolve_failed",
                    model = model,
                    error = %error,
                    "model could not be resolved"
                );
                None
            }
        }
    }

    /// Every configured model, active or not, in precedence order.
    pub fn available_models(&self) -> Vec<ModelChoice> {
        ProviderId::PRECEDENCE
            .into_iter()
            .flat_map(|family| {
                self.models
                    .iter()
                    .filter(move |entry| entry.provider == family)
                    .map(|entry| ModelChoice {
                        label: entry.model.clone(),
                        value: entry.model.clone(),
                    })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ModelRequest, ProviderErrorKind, ProviderFuture, RequestOutcome};

    struct StubProvider {
        id: ProviderId,
        has_credential: bool,
    }

    impl ModelProvider for StubProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        fn check_credential(&self) -> bool {
            self.has_credential
        }

        fn request<'a>(&'a self, _request: ModelRequest) -> ProviderFuture<'a, RequestOutcome> {
            Box::pin(async { RequestOutcome::failure(ProviderError::transport("stub"), None, None) })
        }
    }

    fn registry_with_all_families() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for id in ProviderId::PRECEDENCE {
            registry.register(StubProvider {
                id,
                has_credential: true,
            });
        }
        registry
    }

    #[test]
    fn earlier_family_wins_for_shared_model_names() {
        let registry = registry_with_all_families().with_models([
            ModelConfig::active(ProviderId::OpenRouter, "shared"),
            ModelConfig::active(ProviderId::Perplexity, "shared"),
            ModelConfig::active(ProviderId::Custom, "shared"),
        ]);

        let provider = registry.resolve("shared").expect("model should resolve");
        assert_eq!(provider.id(), ProviderId::Custom);
    }

    #[test]
    fn inactive_entries_are_skipped() {
        let registry = registry_with_all_families().with_models([
            ModelConfig::new(ProviderId::Anthropic, "shared", false),
            ModelConfig::active(ProviderId::OpenRouter, "shared"),
        ]);

        assert_eq!(registry.family_for("shared"), Some(ProviderId::OpenRouter));
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn missing_credential_is_a_configuration_error() {
        let mut registry = ProviderRegistry::new()
            .with_models([ModelConfig::active(ProviderId::Anthropic, "claude")]);
        registry.register(StubProvider {
            id: ProviderId::Anthropic,
            has_credential: false,
        });

        assert!(registry.resolve_family("claude").is_ok());
        let error = registry
            .resolve_checked("claude")
            .err()
            .expect("credential check should fail");
        assert_eq!(error.kind, ProviderErrorKind::Configuration);
        assert!(registry.resolve("claude").is_none());
    }

    #[test]
    fn available_models_lists_all_entries_in_precedence_order() {
        let registry = ProviderRegistry::new().with_models([
            ModelConfig::active(ProviderId::OpenRouter, "router-model"),
            ModelConfig::new(ProviderId::OpenAi, "gpt-4o", false),
            ModelConfig::active(ProviderId::Anthropic, "claude"),
        ]);

        let values = registry
            .available_models()
            .into_iter()
            .map(|choice| choice.value)
            .collect::<Vec<_>>();
        assert_eq!(values, ["claude", "gpt-4o", "router-model"]);
        assert_eq!(registry.available_models()[0].label, "claude");
    }
}
