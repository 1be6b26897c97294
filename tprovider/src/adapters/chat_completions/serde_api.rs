//! Chat-completions HTTP payload serde models and conversion helpers.

use serde::{Deserialize, Serialize};

use crate::{Message, ModelRequest, Role};

use super::profile::{ChatCompletionsProfile, ImagePolicy};

pub(crate) fn build_api_request(
    profile: &ChatCompletionsProfile,
    request: ModelRequest,
) -> ChatCompletionsApiRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system_prompt) = request.system_prompt {
        messages.push(ChatCompletionsApiMessage {
            role: Role::System.as_str(),
            content: ChatCompletionsApiContent::Text(system_prompt),
        });
    }

    messages.extend(
        request
            .messages
            .into_iter()
            .map(|message| ChatCompletionsApiMessage::from_message(message, profile.images)),
    );

    ChatCompletionsApiRequest {
        model: request.model,
        messages,
        max_tokens: request.options.max_tokens,
        temperature: request.options.temperature,
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionsApiRequest {
    pub model: String,
    pub messages: Vec<ChatCompletionsApiMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionsApiMessage {
    pub role: &'static str,
    pub content: ChatCompletionsApiContent,
}

impl ChatCompletionsApiMessage {
    fn from_message(message: Message, images: ImagePolicy) -> Self {
        let content = match (message.image, images) {
            (Some(image), ImagePolicy::Inline) => ChatCompletionsApiContent::Parts(vec![
                ChatCompletionsApiPart::Text {
                    text: message.content,
                },
                ChatCompletionsApiPart::ImageUrl {
                    image_url: ChatCompletionsApiImageUrl {
                        url: image.data_url(),
                    },
                },
            ]),
            _ => ChatCompletionsApiContent::Text(message.content),
        };

        Self {
            role: message.role.as_str(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum ChatCompletionsApiContent {
    Text(String),
    Parts(Vec<ChatCompletionsApiPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum ChatCompletionsApiPart {
    Text { text: String },
    ImageUrl { image_url: ChatCompletionsApiImageUrl },
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionsApiImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionsApiResponse {
    #[serde(default)]
    pub model: Option<String>,
    /// Vendors send `null` as well as omitting the field.
    #[serde(default)]
    pub choices: Option<Vec<ChatCompletionsApiChoice>>,
    #[serde(default)]
    pub usage: Option<ChatCompletionsApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionsApiChoice {
    #[serde(default)]
    pub message: Option<ChatCompletionsApiAnswer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionsApiAnswer {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatCompletionsApiUsage {
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
}
