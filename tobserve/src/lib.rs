//! Production-friendly observability hooks for request orchestration.
//!
//! ```rust
//! use tobserve::{MetricsObservabilityHooks, SafeRequestHooks, TracingObservabilityHooks};
//!
//! let _request_hooks = SafeRequestHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod fanout;
mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use fanout::FanoutRequestHooks;
pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::SafeRequestHooks;
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        FanoutRequestHooks, MetricsObservabilityHooks, SafeRequestHooks,
        TracingObservabilityHooks,
    };
}
