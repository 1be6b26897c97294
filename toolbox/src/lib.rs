//! Unified facade over the toolbox workspace crates.
//!
//! Most applications depend on this crate alone: it re-exports the provider,
//! memory, orchestration and observability crates and wires them together
//! from one [`ToolboxConfig`].
//!
//! ```rust
//! use toolbox::{ControlCommand, ToolboxConfig};
//!
//! let config = ToolboxConfig::from_json_str(
//!     r#"{
//!         "tools": [{"name": "Weather", "model": "gpt-4o", "chat_history": 5}],
//!         "openai_models": [{"name": "gpt-4o"}],
//!         "state": {"kind": "in_memory"}
//!     }"#,
//! )
//! .expect("config should parse");
//!
//! assert_eq!(config.model_configs().len(), 1);
//!
//! let command: ControlCommand =
//!     serde_json::from_str(r#"{"command": "get_available_models"}"#).expect("command");
//! assert_eq!(command, ControlCommand::GetAvailableModels);
//! ```

mod error;
mod macros;

pub mod config;
pub mod control;
pub mod logging;
pub mod prelude;
pub mod runtime;
pub mod util;

pub use tchat;
pub use tcommon;
pub use tmemory;
pub use tobserve;
pub use tprovider;

pub use tchat::{
    ChainHandle, OrchestratorError, OrchestratorErrorKind, RequestHooks, RequestMode,
    RequestOrchestrator, RequestOrchestratorBuilder, RequestState, ToolConfig, ToolReply,
    ToolRequest,
};
pub use tcommon::{GenerationOptions, ToolId};
pub use tmemory::{
    ChatHistory, HistoryEntry, MemoryError, MemoryErrorKind, StateStore, StateStoreConfig,
    UsageStatistics,
};
pub use tobserve::{
    FanoutRequestHooks, MetricsObservabilityHooks, SafeRequestHooks, TracingObservabilityHooks,
};
pub use tprovider::{
    Completion, ImageAttachment, Message, ModelChoice, ModelConfig, ModelProvider, ModelRequest,
    ProviderError, ProviderErrorKind, ProviderId, ProviderRegistry, RequestOutcome, RetryPolicy,
    Role, SecureCredentialManager, TokenUsage,
};

pub use config::{ModelEntry, ToolboxConfig};
pub use control::{ControlCommand, ControlMessage, ControlReply, OutcomeView, dispatch};
pub use error::{ToolboxError, ToolboxErrorKind};
pub use logging::{init_tracing, init_tracing_with};
pub use runtime::{ToolboxRuntime, credentials_from_config, default_hooks, provider_registry};
pub use util::{
    assistant_message, model_request, parse_provider_id, system_message, tool_request,
    tool_request_with_image, user_message,
};

#[cfg(test)]
mod tests {
    use crate::Role;

    #[test]
    fn tb_msg_macro_creates_expected_message() {
        let message = crate::tb_msg!(user => "hello");
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "hello");
    }

    #[test]
    fn tb_messages_macro_builds_message_vector() {
        let messages = crate::tb_messages![
            system => "You are concise.",
            user => "Summarize the forecast",
        ];

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].role, Role::User);
    }

    #[test]
    fn tb_tool_macro_sets_prompt() {
        let tool = crate::tb_tool!("Weather", "gpt-4o", "Be brief.");
        assert_eq!(tool.id().as_str(), "Weather");
        assert_eq!(tool.system_prompt.as_deref(), Some("Be brief."));
        assert!(crate::tb_tool!("Plain", "gpt-4o").system_prompt.is_none());
    }
}
