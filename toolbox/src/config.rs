//! Adapter-level configuration.
//!
//! One JSON document describes the tools, the model lists of every provider
//! family, credentials, the retry defaults and where state is persisted.
//! Field aliases accept the short names used by older configuration files.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tchat::ToolConfig;
use tmemory::StateStoreConfig;
use tprovider::{DEFAULT_REQUEST_TIMEOUT, ModelConfig, ProviderId, RetryPolicy};

use crate::ToolboxError;

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    15
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_active() -> bool {
    true
}

/// One row of a provider family's model table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    #[serde(alias = "model_name")]
    pub name: String,
    #[serde(default = "default_active", alias = "model_active")]
    pub active: bool,
}

impl ModelEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
        }
    }

    pub fn inactive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolboxConfig {
    #[serde(default, alias = "bots")]
    pub tools: Vec<ToolConfig>,

    #[serde(default, alias = "anth_models")]
    pub anthropic_models: Vec<ModelEntry>,
    #[serde(default, alias = "opai_models")]
    pub openai_models: Vec<ModelEntry>,
    #[serde(default)]
    pub custom_models: Vec<ModelEntry>,
    #[serde(default, alias = "pplx_models")]
    pub perplexity_models: Vec<ModelEntry>,
    #[serde(default, alias = "oprt_models")]
    pub openrouter_models: Vec<ModelEntry>,

    #[serde(default, alias = "anth_api_token")]
    pub anthropic_api_key: Option<String>,
    #[serde(default, alias = "opai_api_token")]
    pub openai_api_key: Option<String>,
    #[serde(default, alias = "pplx_api_token")]
    pub perplexity_api_key: Option<String>,
    #[serde(default, alias = "oprt_api_token")]
    pub openrouter_api_key: Option<String>,
    #[serde(default)]
    pub custom_api_url: Option<String>,
    #[serde(default, alias = "custom_api_token")]
    pub custom_api_key: Option<String>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs", alias = "retry_delay")]
    pub retry_delay_secs: u64,
    /// Whether `unauthorized` and `forbidden` answers are retried.
    #[serde(default)]
    pub retry_auth_failures: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub state: StateStoreConfig,
}

impl Default for ToolboxConfig {
    fn default() -> Self {
        Self {
            tools: Vec::new(),
            anthropic_models: Vec::new(),
            openai_models: Vec::new(),
            custom_models: Vec::new(),
            perplexity_models: Vec::new(),
            openrouter_models: Vec::new(),
            anthropic_api_key: None,
            openai_api_key: None,
            perplexity_api_key: None,
            openrouter_api_key: None,
            custom_api_url: None,
            custom_api_key: None,
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            retry_auth_failures: false,
            request_timeout_secs: default_request_timeout_secs(),
            state: StateStoreConfig::default(),
        }
    }
}

impl ToolboxConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ToolboxError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ToolboxError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|error| {
            ToolboxError::config(format!("cannot read {}: {error}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay_secs))
            .with_retry_auth_failures(self.retry_auth_failures)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Flattens the per-family tables in precedence order, skipping blank names.
    pub fn model_configs(&self) -> Vec<ModelConfig> {
        ProviderId::PRECEDENCE
            .into_iter()
            .flat_map(|family| {
                self.models_for(family)
                    .iter()
                    .filter(|entry| !entry.name.trim().is_empty())
                    .map(move |entry| ModelConfig::new(family, entry.name.trim(), entry.active))
            })
            .collect()
    }

    pub fn models_for(&self, family: ProviderId) -> &[ModelEntry] {
        match family {
            ProviderId::Anthropic => &self.anthropic_models,
            ProviderId::OpenAi => &self.openai_models,
            ProviderId::Custom => &self.custom_models,
            ProviderId::Perplexity => &self.perplexity_models,
            ProviderId::OpenRouter => &self.openrouter_models,
        }
    }
}
