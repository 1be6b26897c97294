//! Facade-level errors.

use std::error::Error;
use std::fmt::{Display, Formatter};

use tchat::OrchestratorError;
use tmemory::MemoryError;
use tprovider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolboxErrorKind {
    Config,
    Provider,
    Store,
    Orchestrator,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolboxError {
    pub kind: ToolboxErrorKind,
    pub message: String,
}

impl ToolboxError {
    pub fn new(kind: ToolboxErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ToolboxErrorKind::Config, message)
    }
}

impl Display for ToolboxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ToolboxError {}

impl From<ProviderError> for ToolboxError {
    fn from(value: ProviderError) -> Self {
        Self::new(ToolboxErrorKind::Provider, value.to_string())
    }
}

impl From<MemoryError> for ToolboxError {
    fn from(value: MemoryError) -> Self {
        Self::new(ToolboxErrorKind::Store, value.to_string())
    }
}

impl From<OrchestratorError> for ToolboxError {
    fn from(value: OrchestratorError) -> Self {
        Self::new(ToolboxErrorKind::Orchestrator, value.to_string())
    }
}

impl From<serde_json::Error> for ToolboxError {
    fn from(value: serde_json::Error) -> Self {
        Self::config(format!("invalid configuration: {value}"))
    }
}
