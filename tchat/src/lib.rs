//! Tool request orchestration over model providers.
//!
//! ```rust
//! use tchat::{RequestMode, ToolConfig, ToolRequest};
//!
//! let tool = ToolConfig::new("Weather", "gpt-4o").with_chat_history(5);
//! let request = ToolRequest::new(tool.id(), "Will it rain?").single_shot();
//!
//! assert_eq!(request.mode, RequestMode::SingleShot);
//! assert!(tool.validate().is_ok());
//! ```

mod assembly;
mod config;
mod error;
mod hooks;
mod inflight;
mod orchestrator;
mod sleeper;
mod state;

pub mod prelude {
    pub use crate::{
        ChainHandle, NoopRequestHooks, OrchestratorError, OrchestratorErrorKind, RequestHooks,
        RequestMode, RequestOrchestrator, RequestOrchestratorBuilder, RequestState, Sleeper,
        TokioSleeper, ToolConfig, ToolReply, ToolRequest,
    };
    pub use tcommon::ToolId;
}

pub use assembly::assemble_messages;
pub use config::ToolConfig;
pub use error::{OrchestratorError, OrchestratorErrorKind};
pub use hooks::{NoopRequestHooks, RequestHooks};
pub use inflight::{ChainHandle, ChainId, InFlightRegistry};
pub use orchestrator::{
    RequestMode, RequestOrchestrator, RequestOrchestratorBuilder, ToolReply, ToolRequest,
};
pub use sleeper::{Sleeper, TokioSleeper};
pub use state::RequestState;
pub use tcommon::ToolId;
