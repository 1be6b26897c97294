//! Common `tprovider` imports for downstream crates.

pub use crate::{
    Completion, ErrorClass, HttpTransport, ImageAttachment, Message, ModelChoice, ModelConfig,
    ModelProvider, ModelRequest, ModelRequestBuilder, ProviderError, ProviderErrorKind,
    ProviderId, ProviderRegistry, RequestOutcome, RetryPolicy, Role, SecureCredentialManager,
    TokenUsage,
};
pub use tcommon::{BoxFuture, GenerationOptions};
