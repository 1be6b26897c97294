//! Layout of the per-tool and per-model state slots.
//!
//! ```rust
//! use tcommon::ToolId;
//! use tmemory::StateKey;
//!
//! let key = StateKey::tool(&ToolId::normalize("weather"));
//! assert_eq!(key.history(), "weather.statistics.messages");
//! assert_eq!(StateKey::model("gpt-4o").tokens_input(), "models.gpt-4o.statistics.tokens_input");
//! ```

use tcommon::ToolId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    prefix: String,
}

impl StateKey {
    pub fn tool(tool: &ToolId) -> Self {
        Self {
            prefix: tool.as_str().to_string(),
        }
    }

    /// Model names may carry `/` or `.`; they are normalized like tool names.
    pub fn model(model: &str) -> Self {
        Self {
            prefix: format!("models.{}", ToolId::normalize(model)),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn slot(&self, suffix: &str) -> String {
        format!("{}.{suffix}", self.prefix)
    }

    pub fn history(&self) -> String {
        self.slot("statistics.messages")
    }

    pub fn request_state(&self) -> String {
        self.slot("request.state")
    }

    pub fn request_body(&self) -> String {
        self.slot("request.body")
    }

    pub fn response_raw(&self) -> String {
        self.slot("response.raw")
    }

    pub fn response_error(&self) -> String {
        self.slot("response.error")
    }

    pub fn text_response(&self) -> String {
        self.slot("text_response")
    }

    pub fn tokens_input(&self) -> String {
        self.slot("statistics.tokens_input")
    }

    pub fn tokens_output(&self) -> String {
        self.slot("statistics.tokens_output")
    }

    pub fn request_count(&self) -> String {
        self.slot("statistics.request_count")
    }

    pub fn last_request(&self) -> String {
        self.slot("statistics.last_request")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_prefix_is_normalized() {
        let key = StateKey::model("openai/gpt-4o.mini");
        assert_eq!(key.prefix(), "models.openai_gpt-4o_mini");
        assert_eq!(key.request_state(), "models.openai_gpt-4o_mini.request.state");
    }
}
