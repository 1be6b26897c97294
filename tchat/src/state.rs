//! Request lifecycle states.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// `idle -> start -> (success | error) -> retry -> (success | failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    #[default]
    Idle,
    Start,
    Success,
    Error,
    Retry,
    Failed,
}

impl RequestState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Start => "start",
            Self::Success => "success",
            Self::Error => "error",
            Self::Retry => "retry",
            Self::Failed => "failed",
        }
    }

    /// Whether a chain in this state has finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl Display for RequestState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_render_lowercase() {
        assert_eq!(RequestState::Retry.to_string(), "retry");
        assert_eq!(
            serde_json::to_value(RequestState::Failed).expect("serialize"),
            serde_json::json!("failed")
        );
        assert!(RequestState::Success.is_terminal());
        assert!(!RequestState::Error.is_terminal());
    }
}
