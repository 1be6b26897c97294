//! Tool definitions.
//!
//! A tool is a named persona bound to one model: a system prompt, an optional
//! example exchange and generation settings. Field aliases accept the
//! `bot_*` names used by older configuration files.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tcommon::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, GenerationOptions, ToolId};
use tprovider::RetryPolicy;

use crate::OrchestratorError;

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(alias = "bot_name")]
    pub name: String,
    #[serde(alias = "bot_model")]
    pub model: String,
    #[serde(default, alias = "bot_system_prompt")]
    pub system_prompt: Option<String>,
    #[serde(default, alias = "bot_example_request")]
    pub example_request: Option<String>,
    #[serde(default, alias = "bot_example_response")]
    pub example_response: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Number of exchanges kept in the ledger; zero disables history.
    #[serde(default)]
    pub chat_history: usize,
    /// Overrides the orchestrator-wide retry count.
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// Overrides the orchestrator-wide retry delay.
    #[serde(default)]
    pub retry_delay_secs: Option<u64>,
    /// Whether images sent with a request are forwarded to the model.
    #[serde(default)]
    pub vision: bool,
    #[serde(default)]
    pub include_images_in_history: bool,
}

impl ToolConfig {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            system_prompt: None,
            example_request: None,
            example_response: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            chat_history: 0,
            max_retries: None,
            retry_delay_secs: None,
            vision: false,
            include_images_in_history: false,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_example(mut self, request: impl Into<String>, response: impl Into<String>) -> Self {
        self.example_request = Some(request.into());
        self.example_response = Some(response.into());
        self
    }

    pub fn with_chat_history(mut self, depth: usize) -> Self {
        self.chat_history = depth;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = Some(max_retries);
        self.retry_delay_secs = Some(retry_delay.as_secs());
        self
    }

    pub fn with_vision(mut self, vision: bool, include_images_in_history: bool) -> Self {
        self.vision = vision;
        self.include_images_in_history = include_images_in_history;
        self
    }

    pub fn id(&self) -> ToolId {
        ToolId::normalize(&self.name)
    }

    pub fn options(&self) -> GenerationOptions {
        GenerationOptions::default()
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
    }

    /// The example exchange, only when both sides are non-blank.
    pub fn example_pair(&self) -> Option<(&str, &str)> {
        let request = self.example_request.as_deref().filter(|v| !v.trim().is_empty())?;
        let response = self.example_response.as_deref().filter(|v| !v.trim().is_empty())?;
        Some((request, response))
    }

    pub fn retry_policy(&self, base: &RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(base.max_retries),
            retry_delay: self
                .retry_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(base.retry_delay),
            retry_auth_failures: base.retry_auth_failures,
        }
    }

    pub fn validate(&self) -> Result<(), OrchestratorError> {
        if self.id().is_empty() {
            return Err(OrchestratorError::configuration("tool name must not be empty"));
        }

        if self.model.trim().is_empty() {
            return Err(OrchestratorError::configuration(format!(
                "tool '{}' has no model",
                self.name
            )));
        }

        if self.max_tokens == 0 {
            return Err(OrchestratorError::configuration(format!(
                "tool '{}' must allow at least one output token",
                self.name
            )));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(OrchestratorError::configuration(format!(
                "tool '{}' temperature must be within [0.0, 2.0]",
                self.name
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_field_names_deserialize_with_defaults() {
        let tool: ToolConfig = serde_json::from_value(serde_json::json!({
            "bot_name": "Weather Bot",
            "bot_model": "claude-3-haiku",
            "bot_system_prompt": "be brief",
            "chat_history": 4
        }))
        .expect("tool should parse");

        assert_eq!(tool.id().as_str(), "Weather_Bot");
        assert_eq!(tool.max_tokens, 2000);
        assert_eq!(tool.temperature, 0.6);
        assert_eq!(tool.chat_history, 4);
        assert!(tool.example_pair().is_none());
        tool.validate().expect("tool should be valid");
    }

    #[test]
    fn example_pair_requires_both_sides() {
        let tool = ToolConfig::new("t", "m").with_example("q", "  ");
        assert!(tool.example_pair().is_none());

        let tool = ToolConfig::new("t", "m").with_example("q", "a");
        assert_eq!(tool.example_pair(), Some(("q", "a")));
    }

    #[test]
    fn retry_policy_falls_back_to_base() {
        let base = RetryPolicy::new(3, Duration::from_secs(15)).with_retry_auth_failures(true);
        let inherited = ToolConfig::new("t", "m").retry_policy(&base);
        assert_eq!(inherited, base);

        let tuned = ToolConfig::new("t", "m")
            .with_retries(1, Duration::from_secs(2))
            .retry_policy(&base);
        assert_eq!(tuned.max_retries, 1);
        assert_eq!(tuned.retry_delay, Duration::from_secs(2));
        assert!(tuned.retry_auth_failures);
    }

    #[test]
    fn validate_rejects_blank_names_and_models() {
        assert!(ToolConfig::new("", "m").validate().is_err());
        assert!(ToolConfig::new("t", " ").validate().is_err());

        let mut tool = ToolConfig::new("t", "m");
        tool.temperature = 3.5;
        assert!(tool.validate().is_err());
    }
}
