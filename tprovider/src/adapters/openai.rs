//! OpenAI chat completions.

use std::sync::Arc;

use crate::adapters::chat_completions::{
    ChatCompletionsProfile, ChatCompletionsProvider, ImagePolicy, ModelSource,
};
use crate::{HttpTransport, ProviderError, ProviderId, SecureCredentialManager};

pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

pub const OPENAI_PROFILE: ChatCompletionsProfile = ChatCompletionsProfile {
    provider: ProviderId::OpenAi,
    default_url: Some(OPENAI_CHAT_COMPLETIONS_URL),
    images: ImagePolicy::Inline,
    model_source: ModelSource::Request,
    status_overrides: &[],
    api_key_required: true,
};

impl ChatCompletionsProvider {
    pub fn openai(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::new(OPENAI_PROFILE, credentials, transport)
    }
}

impl SecureCredentialManager {
    pub fn set_openai_api_key(&self, api_key: impl Into<String>) -> Result<(), ProviderError> {
        self.set_api_key(ProviderId::OpenAi, api_key)
    }
}
