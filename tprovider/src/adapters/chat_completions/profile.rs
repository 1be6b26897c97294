use crate::{ProviderErrorKind, ProviderId};

/// What happens to image attachments on outgoing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePolicy {
    /// Sent as an `image_url` content part carrying a data URL.
    Inline,
    /// Silently removed; the text part is still sent.
    Drop,
}

/// Where the reported model name comes from on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    Request,
    /// The `model` field of the reply, falling back to the request model.
    Response,
}

/// Per-vendor differences between chat-completions compatible APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatCompletionsProfile {
    pub provider: ProviderId,
    /// `None` means the endpoint must be configured through the credential manager.
    pub default_url: Option<&'static str>,
    pub images: ImagePolicy,
    pub model_source: ModelSource,
    /// Checked before the shared status table.
    pub status_overrides: &'static [(u16, ProviderErrorKind)],
    pub api_key_required: bool,
}
