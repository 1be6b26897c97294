//! Perplexity chat completions. The API is text-only, so images are dropped.

use std::sync::Arc;

use crate::adapters::chat_completions::{
    ChatCompletionsProfile, ChatCompletionsProvider, ImagePolicy, ModelSource,
};
use crate::{HttpTransport, ProviderError, ProviderId, SecureCredentialManager};

pub const PERPLEXITY_CHAT_COMPLETIONS_URL: &str = "https://api.perplexity.ai/chat/completions";

pub const PERPLEXITY_PROFILE: ChatCompletionsProfile = ChatCompletionsProfile {
    provider: ProviderId::Perplexity,
    default_url: Some(PERPLEXITY_CHAT_COMPLETIONS_URL),
    images: ImagePolicy::Drop,
    model_source: ModelSource::Request,
    status_overrides: &[],
    api_key_required: true,
};

impl ChatCompletionsProvider {
    pub fn perplexity(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::new(PERPLEXITY_PROFILE, credentials, transport)
    }
}

impl SecureCredentialManager {
    pub fn set_perplexity_api_key(&self, api_key: impl Into<String>) -> Result<(), ProviderError> {
        self.set_api_key(ProviderId::Perplexity, api_key)
    }
}
