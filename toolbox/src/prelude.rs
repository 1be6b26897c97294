//! Common imports for applications built on the toolbox.

pub use crate::{
    ControlCommand, ControlReply, ImageAttachment, Message, ModelChoice, ModelRequest,
    OrchestratorError, ProviderError, ProviderId, RequestMode, RequestOrchestrator,
    RequestOutcome, RequestState, Role, ToolConfig, ToolId, ToolReply, ToolRequest,
    ToolboxConfig, ToolboxError, ToolboxRuntime,
};
pub use crate::{tb_messages, tb_msg, tb_tool};
