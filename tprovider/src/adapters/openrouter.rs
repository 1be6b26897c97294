//! OpenRouter chat completions.
//!
//! OpenRouter reinterprets a handful of status codes: 402 when the account is
//! out of credit, 403 when moderation flagged the input, 408 when the
//! upstream model timed out and 502 when the chosen model is down.

use std::sync::Arc;

use crate::adapters::chat_completions::{
    ChatCompletionsProfile, ChatCompletionsProvider, ImagePolicy, ModelSource,
};
use crate::{HttpTransport, ProviderError, ProviderErrorKind, ProviderId, SecureCredentialManager};

pub const OPENROUTER_CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub const OPENROUTER_STATUS_OVERRIDES: [(u16, ProviderErrorKind); 4] = [
    (402, ProviderErrorKind::InsufficientCredit),
    (403, ProviderErrorKind::ModerationFlagged),
    (408, ProviderErrorKind::UpstreamTimeout),
    (502, ProviderErrorKind::UpstreamModelDown),
];

pub const OPENROUTER_PROFILE: ChatCompletionsProfile = ChatCompletionsProfile {
    provider: ProviderId::OpenRouter,
    default_url: Some(OPENROUTER_CHAT_COMPLETIONS_URL),
    images: ImagePolicy::Inline,
    model_source: ModelSource::Response,
    status_overrides: &OPENROUTER_STATUS_OVERRIDES,
    api_key_required: true,
};

impl ChatCompletionsProvider {
    pub fn openrouter(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::new(OPENROUTER_PROFILE, credentials, transport)
    }
}

impl SecureCredentialManager {
    pub fn set_openrouter_api_key(&self, api_key: impl Into<String>) -> Result<(), ProviderError> {
        self.set_api_key(ProviderId::OpenRouter, api_key)
    }
}
