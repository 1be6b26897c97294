//! Tracing-based observability hooks for request chains.
//!
//! ```rust
//! use tchat::RequestHooks;
//! use tobserve::TracingObservabilityHooks;
//!
//! fn accepts_request_hooks(_hooks: &dyn RequestHooks) {}
//!
//! let hooks = TracingObservabilityHooks;
//! accepts_request_hooks(&hooks);
//! ```

use std::time::Duration;

use tchat::{OrchestratorError, RequestHooks, RequestState};
use tprovider::{ProviderError, ProviderId, TokenUsage};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl RequestHooks for TracingObservabilityHooks {
    fn on_state_change(&self, subject: &str, state: RequestState) {
        tracing::debug!(
            phase = "request",
            event = "state_change",
            subject,
            state = %state
        );
    }

    fn on_attempt_start(&self, subject: &str, provider: ProviderId, attempt: u32) {
        tracing::info!(
            phase = "request",
            event = "attempt_start",
            subject,
            provider = %provider,
            attempt
        );
    }

    fn on_retry_scheduled(
        &self,
        subject: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        tracing::warn!(
            phase = "request",
            event = "retry_scheduled",
            subject,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error_kind = %error.kind,
            retryable = error.retryable,
            error = %error
        );
    }

    fn on_success(&self, subject: &str, model: &str, attempts: u32, usage: TokenUsage) {
        tracing::info!(
            phase = "request",
            event = "success",
            subject,
            model,
            attempts,
            tokens_input = usage.input_tokens,
            tokens_output = usage.output_tokens
        );
    }

    fn on_failure(&self, subject: &str, attempts: u32, error: &OrchestratorError) {
        tracing::error!(
            phase = "request",
            event = "failure",
            subject,
            attempts,
            error_kind = ?error.kind,
            error = %error
        );
    }
}
