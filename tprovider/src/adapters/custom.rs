//! Self-hosted or third-party endpoints that speak the chat-completions dialect.
//!
//! The endpoint URL is mandatory; the bearer token is optional because many
//! local inference servers run without authentication.

use std::sync::Arc;

use crate::adapters::chat_completions::{
    ChatCompletionsProfile, ChatCompletionsProvider, ImagePolicy, ModelSource,
};
use crate::{HttpTransport, ProviderError, ProviderId, SecureCredentialManager};

pub const CUSTOM_PROFILE: ChatCompletionsProfile = ChatCompletionsProfile {
    provider: ProviderId::Custom,
    default_url: None,
    images: ImagePolicy::Inline,
    model_source: ModelSource::Request,
    status_overrides: &[],
    api_key_required: false,
};

impl ChatCompletionsProvider {
    pub fn custom(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::new(CUSTOM_PROFILE, credentials, transport)
    }
}

impl SecureCredentialManager {
    pub fn set_custom_endpoint(
        &self,
        url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<(), ProviderError> {
        self.set_endpoint(ProviderId::Custom, url)?;
        match api_key.filter(|key| !key.trim().is_empty()) {
            Some(key) => self.set_api_key(ProviderId::Custom, key),
            None => Ok(()),
        }
    }
}
