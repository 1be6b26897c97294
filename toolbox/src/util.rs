//! Small convenience constructors for common types.

use crate::{ImageAttachment, Message, ModelRequest, ProviderId, Role, ToolId, ToolRequest};

pub fn system_message(content: impl Into<String>) -> Message {
    Message::new(Role::System, content)
}

pub fn user_message(content: impl Into<String>) -> Message {
    Message::new(Role::User, content)
}

pub fn assistant_message(content: impl Into<String>) -> Message {
    Message::new(Role::Assistant, content)
}

/// Retrying request against a configured tool.
pub fn tool_request(tool: &str, text: impl Into<String>) -> ToolRequest {
    ToolRequest::new(ToolId::normalize(tool), text)
}

/// Tool request carrying an image given as a `data:` URL. Unparseable URLs
/// leave the request without an image.
pub fn tool_request_with_image(tool: &str, text: impl Into<String>, data_url: &str) -> ToolRequest {
    tool_request(tool, text).with_image(ImageAttachment::from_data_url(data_url))
}

pub fn model_request(model: impl Into<String>, text: impl Into<String>) -> ModelRequest {
    ModelRequest::new(model, vec![user_message(text)])
}

pub fn parse_provider_id(value: &str) -> Option<ProviderId> {
    match value.trim().to_ascii_lowercase().as_str() {
        "anthropic" | "claude" | "anth" => Some(ProviderId::Anthropic),
        "openai" | "open_ai" | "opai" => Some(ProviderId::OpenAi),
        "custom" | "local" => Some(ProviderId::Custom),
        "perplexity" | "pplx" => Some(ProviderId::Perplexity),
        "openrouter" | "open_router" | "oprt" => Some(ProviderId::OpenRouter),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_provider_id, tool_request, tool_request_with_image};
    use crate::{ProviderId, RequestMode};

    #[test]
    fn parse_provider_id_accepts_short_names() {
        assert_eq!(parse_provider_id("OpenAI"), Some(ProviderId::OpenAi));
        assert_eq!(parse_provider_id("pplx"), Some(ProviderId::Perplexity));
        assert_eq!(parse_provider_id(" oprt "), Some(ProviderId::OpenRouter));
        assert_eq!(parse_provider_id("claude"), Some(ProviderId::Anthropic));
        assert_eq!(parse_provider_id("ollama"), None);
    }

    #[test]
    fn tool_request_normalizes_names_and_retries() {
        let request = tool_request("Weather Bot", "hi");
        assert_eq!(request.tool.as_str(), "Weather_Bot");
        assert_eq!(request.mode, RequestMode::Retrying);

        let with_image = tool_request_with_image("Weather Bot", "hi", "data:image/png;base64,AAAA");
        assert!(with_image.image.is_some());
        assert!(tool_request_with_image("x", "hi", "https://example.com/a.png").image.is_none());
    }
}
