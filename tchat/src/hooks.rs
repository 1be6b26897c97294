//! Lifecycle callbacks fired by the orchestrator.
//!
//! `subject` is the state prefix of the tool or model being served.

use std::time::Duration;

use tprovider::{ProviderError, ProviderId, TokenUsage};

use crate::{OrchestratorError, RequestState};

pub trait RequestHooks: Send + Sync {
    fn on_state_change(&self, _subject: &str, _state: RequestState) {}

    fn on_attempt_start(&self, _subject: &str, _provider: ProviderId, _attempt: u32) {}

    fn on_retry_scheduled(
        &self,
        _subject: &str,
        _attempt: u32,
        _delay: Duration,
        _error: &ProviderError,
    ) {
    }

    fn on_success(&self, _subject: &str, _model: &str, _attempts: u32, _usage: TokenUsage) {}

    fn on_failure(&self, _subject: &str, _attempts: u32, _error: &OrchestratorError) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRequestHooks;

impl RequestHooks for NoopRequestHooks {}
