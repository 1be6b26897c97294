//! Orchestration errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use tmemory::MemoryError;
use tprovider::{ErrorClass, ProviderError, RequestOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorErrorKind {
    Configuration,
    Validation,
    Provider,
    Store,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorError {
    pub kind: OrchestratorErrorKind,
    pub message: String,
    /// Provider calls made before the chain gave up.
    pub attempts: u32,
    /// The last provider outcome, kept for inspection.
    pub outcome: Option<RequestOutcome>,
}

impl OrchestratorError {
    pub fn new(kind: OrchestratorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            attempts: 0,
            outcome: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(OrchestratorErrorKind::Configuration, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(OrchestratorErrorKind::Validation, message)
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::new(OrchestratorErrorKind::Store, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(OrchestratorErrorKind::Cancelled, message)
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_outcome(mut self, outcome: RequestOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Provider error behind this failure, if the chain reached a provider.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        self.outcome.as_ref().and_then(RequestOutcome::error)
    }

    pub fn is_terminal_configuration(&self) -> bool {
        matches!(
            self.kind,
            OrchestratorErrorKind::Configuration | OrchestratorErrorKind::Validation
        )
    }
}

impl Display for OrchestratorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for OrchestratorError {}

impl From<&ProviderError> for OrchestratorError {
    fn from(value: &ProviderError) -> Self {
        let kind = match value.kind.class() {
            ErrorClass::Configuration => OrchestratorErrorKind::Configuration,
            ErrorClass::Validation => OrchestratorErrorKind::Validation,
            _ => OrchestratorErrorKind::Provider,
        };
        Self::new(kind, value.to_string())
    }
}

impl From<ProviderError> for OrchestratorError {
    fn from(value: ProviderError) -> Self {
        Self::from(&value)
    }
}

impl From<MemoryError> for OrchestratorError {
    fn from(value: MemoryError) -> Self {
        Self::store(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_keep_their_class() {
        let missing = OrchestratorError::from(ProviderError::configuration("no api url"));
        assert_eq!(missing.kind, OrchestratorErrorKind::Configuration);
        assert!(missing.is_terminal_configuration());

        let invalid = OrchestratorError::from(ProviderError::validation("model is empty"));
        assert_eq!(invalid.kind, OrchestratorErrorKind::Validation);

        let limited = OrchestratorError::from(ProviderError::from_status(429, "slow down", &[]));
        assert_eq!(limited.kind, OrchestratorErrorKind::Provider);
        assert!(limited.message.starts_with("rate_limited"));
        assert!(!limited.is_terminal_configuration());
    }
}
