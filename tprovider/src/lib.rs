//! Provider abstraction for multi-vendor prompt requests.
//!
//! ```rust
//! use tprovider::{Message, ModelRequest, ProviderId};
//!
//! let request = ModelRequest::builder("gpt-4o-mini")
//!     .message(Message::user("Summarize today's weather"))
//!     .system_prompt("Answer in one sentence")
//!     .build()
//!     .expect("request should validate");
//!
//! assert_eq!(request.options.max_tokens, 2000);
//! assert_eq!(ProviderId::PRECEDENCE[0], ProviderId::Anthropic);
//! ```

pub mod adapters;
mod credentials;
mod error;
mod model;
mod provider;
mod registry;
mod resilience;
mod transport;

pub mod prelude;

pub use credentials::{SecretString, SecureCredentialManager};
pub use error::{ErrorClass, ProviderError, ProviderErrorKind};
pub use model::{
    Completion, ImageAttachment, Message, ModelRequest, ModelRequestBuilder, ProviderId,
    RequestOutcome, Role, TokenUsage,
};
pub use provider::{ModelProvider, ProviderFuture};
pub use registry::{ModelChoice, ModelConfig, ProviderRegistry};
pub use resilience::RetryPolicy;
#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
pub use transport::{DEFAULT_REQUEST_TIMEOUT, HttpReply, HttpRequest, HttpTransport};
