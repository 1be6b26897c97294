//! Metrics-based observability hooks for request chains.
//!
//! ```rust
//! use tchat::RequestHooks;
//! use tobserve::MetricsObservabilityHooks;
//!
//! fn accepts_request_hooks(_hooks: &dyn RequestHooks) {}
//!
//! let hooks = MetricsObservabilityHooks;
//! accepts_request_hooks(&hooks);
//! ```

use std::time::Duration;

use tchat::{OrchestratorError, RequestHooks, RequestState};
use tprovider::{ProviderError, ProviderId, TokenUsage};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl RequestHooks for MetricsObservabilityHooks {
    fn on_state_change(&self, _subject: &str, state: RequestState) {
        metrics::counter!(
            "toolbox_request_state_total",
            "state" => state.as_str()
        )
        .increment(1);
    }

    fn on_attempt_start(&self, _subject: &str, provider: ProviderId, _attempt: u32) {
        metrics::counter!(
            "toolbox_request_attempt_start_total",
            "provider" => provider.to_string()
        )
        .increment(1);
    }

    fn on_retry_scheduled(
        &self,
        _subject: &str,
        _attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        metrics::counter!(
            "toolbox_request_retry_scheduled_total",
            "error_kind" => error.kind.to_string()
        )
        .increment(1);
        metrics::histogram!("toolbox_request_retry_delay_seconds").record(delay.as_secs_f64());
    }

    fn on_success(&self, _subject: &str, model: &str, attempts: u32, usage: TokenUsage) {
        metrics::counter!(
            "toolbox_request_success_total",
            "model" => model.to_string()
        )
        .increment(1);
        metrics::histogram!("toolbox_request_attempts_per_success").record(attempts as f64);
        metrics::counter!(
            "toolbox_request_tokens_input_total",
            "model" => model.to_string()
        )
        .increment(usage.input_tokens);
        metrics::counter!(
            "toolbox_request_tokens_output_total",
            "model" => model.to_string()
        )
        .increment(usage.output_tokens);
    }

    fn on_failure(&self, _subject: &str, attempts: u32, error: &OrchestratorError) {
        metrics::counter!(
            "toolbox_request_failure_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!("toolbox_request_attempts_per_failure").record(attempts as f64);
    }
}
