//! Forwards every callback to several hook sets in order.

use std::sync::Arc;
use std::time::Duration;

use tchat::{OrchestratorError, RequestHooks, RequestState};
use tprovider::{ProviderError, ProviderId, TokenUsage};

#[derive(Clone, Default)]
pub struct FanoutRequestHooks {
    hooks: Vec<Arc<dyn RequestHooks>>,
}

impl FanoutRequestHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hooks: Arc<dyn RequestHooks>) -> Self {
        self.hooks.push(hooks);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl RequestHooks for FanoutRequestHooks {
    fn on_state_change(&self, subject: &str, state: RequestState) {
        for hooks in &self.hooks {
            hooks.on_state_change(subject, state);
        }
    }

    fn on_attempt_start(&self, subject: &str, provider: ProviderId, attempt: u32) {
        for hooks in &self.hooks {
            hooks.on_attempt_start(subject, provider, attempt);
        }
    }

    fn on_retry_scheduled(
        &self,
        subject: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        for hooks in &self.hooks {
            hooks.on_retry_scheduled(subject, attempt, delay, error);
        }
    }

    fn on_success(&self, subject: &str, model: &str, attempts: u32, usage: TokenUsage) {
        for hooks in &self.hooks {
            hooks.on_success(subject, model, attempts, usage);
        }
    }

    fn on_failure(&self, subject: &str, attempts: u32, error: &OrchestratorError) {
        for hooks in &self.hooks {
            hooks.on_failure(subject, attempts, error);
        }
    }
}
