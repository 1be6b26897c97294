use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use tchat::{OrchestratorError, RequestHooks, RequestState};
use tprovider::{ProviderError, ProviderId, TokenUsage};

pub struct SafeRequestHooks<H> {
    inner: H,
}

impl<H> SafeRequestHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> RequestHooks for SafeRequestHooks<H>
where
    H: RequestHooks,
{
    fn on_state_change(&self, subject: &str, state: RequestState) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_state_change(subject, state)
        }));
    }

    fn on_attempt_start(&self, subject: &str, provider: ProviderId, attempt: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_attempt_start(subject, provider, attempt)
        }));
    }

    fn on_retry_scheduled(
        &self,
        subject: &str,
        attempt: u32,
        delay: Duration,
        error: &ProviderError,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_retry_scheduled(subject, attempt, delay, error)
        }));
    }

    fn on_success(&self, subject: &str, model: &str, attempts: u32, usage: TokenUsage) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_success(subject, model, attempts, usage)
        }));
    }

    fn on_failure(&self, subject: &str, attempts: u32, error: &OrchestratorError) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_failure(subject, attempts, error)
        }));
    }
}
