//! Subscriber setup for binaries embedding the toolbox.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::ToolboxError;

pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Installs a stderr formatter filtered by `RUST_LOG`, falling back to `info`.
pub fn init_tracing() -> Result<(), ToolboxError> {
    init_tracing_with(DEFAULT_LOG_DIRECTIVE)
}

pub fn init_tracing_with(default_directive: &str) -> Result<(), ToolboxError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|error| ToolboxError::config(format!("invalid log filter: {error}")))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|error| ToolboxError::config(format!("tracing already initialized: {error}")))
}

#[cfg(test)]
mod tests {
    use super::init_tracing_with;

    #[test]
    fn second_initialization_is_reported() {
        let _ = init_tracing_with("debug");
        assert!(init_tracing_with("debug").is_err());
    }
}
