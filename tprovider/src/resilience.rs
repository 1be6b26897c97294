//! Retry policy for request chains.
//!
//! Attempts are counted from zero. A chain with `max_retries = R` makes at
//! most `R + 1` attempts; the final one is scheduled without delay.
//!
//! ```rust
//! use std::time::Duration;
//! use tprovider::{ProviderError, RetryPolicy};
//!
//! let policy = RetryPolicy::new(2, Duration::from_secs(5));
//! let error = ProviderError::transport("connection reset");
//!
//! assert!(policy.should_retry(0, &error));
//! assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(5));
//! assert_eq!(policy.delay_for_attempt(1), Duration::ZERO);
//! assert!(!policy.should_retry(2, &error));
//! ```

use std::time::Duration;

use crate::ProviderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// When false, `unauthorized` and `forbidden` end the chain at once.
    pub retry_auth_failures: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(15),
            retry_auth_failures: false,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
            ..Self::default()
        }
    }

    /// Policy for callers that want exactly one attempt.
    pub fn single_shot() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn with_retry_auth_failures(mut self, retry: bool) -> Self {
        self.retry_auth_failures = retry;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// `attempt` is the zero-based index of the attempt that just failed.
    pub fn should_retry(&self, attempt: u32, error: &ProviderError) -> bool {
        if !error.retryable || attempt >= self.max_retries {
            return false;
        }

        self.retry_auth_failures || !error.kind.is_authentication()
    }

    /// Delay before the attempt following `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt.saturating_add(1) >= self.max_retries {
            Duration::ZERO
        } else {
            self.retry_delay
        }
    }
}
