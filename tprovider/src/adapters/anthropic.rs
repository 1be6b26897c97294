//! Anthropic messages API.
//!
//! Differs from the chat-completions families in three places: the key goes
//! in `x-api-key` with a pinned `anthropic-version`, the system prompt is a
//! top-level `system` field, and images are base64 `source` blocks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapters::reply::{RejectedReply, accept_reply};
use crate::{
    Completion, HttpRequest, HttpTransport, Message, ModelProvider, ModelRequest, ProviderError,
    ProviderFuture, ProviderId, RequestOutcome, Role, SecureCredentialManager, TokenUsage,
};

pub const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub struct AnthropicProvider {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn HttpTransport>,
}

impl AnthropicProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    fn http_request(&self, body: Value) -> Result<HttpRequest, ProviderError> {
        let url = self
            .credentials
            .endpoint(ProviderId::Anthropic)?
            .unwrap_or_else(|| ANTHROPIC_MESSAGES_URL.to_string());
        let api_key = self
            .credentials
            .api_key(ProviderId::Anthropic)?
            .ok_or_else(|| ProviderError::configuration("no anthropic api key configured"))?;

        Ok(HttpRequest::new(url, body)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION))
    }
}

impl SecureCredentialManager {
    pub fn set_anthropic_api_key(&self, api_key: impl Into<String>) -> Result<(), ProviderError> {
        self.set_api_key(ProviderId::Anthropic, api_key)
    }
}

impl ModelProvider for AnthropicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn check_credential(&self) -> bool {
        self.credentials
            .has_api_key(ProviderId::Anthropic)
            .unwrap_or(false)
    }

    fn request<'a>(&'a self, request: ModelRequest) -> ProviderFuture<'a, RequestOutcome> {
        Box::pin(async move {
            if let Err(error) = request.validate() {
                return RequestOutcome::failure(error, None, None);
            }

            let requested_model = request.model.clone();
            let request_data = match serde_json::to_value(build_api_request(request)) {
                Ok(value) => value,
                Err(err) => {
                    return RequestOutcome::failure(
                        ProviderError::validation(format!("request could not be encoded: {err}")),
                        None,
                        None,
                    );
                }
            };

            let http_request = match self.http_request(request_data.clone()) {
                Ok(http_request) => http_request,
                Err(error) => return RequestOutcome::failure(error, Some(request_data), None),
            };

            let reply = match self.transport.post_json(http_request).await {
                Ok(reply) => reply,
                Err(error) => return RequestOutcome::failure(error, Some(request_data), None),
            };

            let outcome = accept_reply(ProviderId::Anthropic, &reply, &[]).and_then(|body| {
                let completion = interpret(&requested_model, body.clone())?;
                Ok((completion, body))
            });

            match outcome {
                Ok((completion, body)) => RequestOutcome::success(completion, request_data, body),
                Err(rejected) => RequestOutcome::failure(
                    rejected.error,
                    Some(request_data),
                    rejected.response_data,
                ),
            }
        })
    }
}

fn build_api_request(request: ModelRequest) -> AnthropicApiRequest {
    // System-role messages have no place in the transcript; fold them into `system`.
    let mut system_parts = request.system_prompt.into_iter().collect::<Vec<_>>();
    let mut messages = Vec::with_capacity(request.messages.len());
    for message in request.messages {
        if message.role == Role::System {
            system_parts.push(message.content);
        } else {
            messages.push(AnthropicApiMessage::from(message));
        }
    }

    AnthropicApiRequest {
        model: request.model,
        max_tokens: request.options.max_tokens,
        temperature: request.options.temperature,
        system: (!system_parts.is_empty()).then(|| system_parts.join("\n\n")),
        messages,
    }
}

fn interpret(requested_model: &str, body: Value) -> Result<Completion, RejectedReply> {
    let reject = |error: ProviderError, body: Value| RejectedReply {
        error,
        response_data: Some(body),
    };

    let parsed = match serde_json::from_value::<AnthropicApiResponse>(body.clone()) {
        Ok(parsed) => parsed,
        Err(err) => {
            return Err(reject(
                ProviderError::malformed_body(format!(
                    "anthropic reply has an unexpected shape: {err}"
                )),
                body,
            ));
        }
    };

    let content = parsed.content.unwrap_or_default();
    if content.is_empty() {
        return Err(reject(
            ProviderError::no_answer("anthropic returned no content blocks"),
            body,
        ));
    }

    if parsed.role.as_deref() != Some("assistant") {
        return Err(reject(
            ProviderError::no_answer(format!(
                "anthropic answered with role {:?}",
                parsed.role.unwrap_or_default()
            )),
            body,
        ));
    }

    let text = content
        .into_iter()
        .next()
        .and_then(|block| block.text)
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(reject(
            ProviderError::empty_answer("anthropic returned an empty answer"),
            body,
        ));
    }

    let usage = parsed.usage.unwrap_or_default();
    Ok(Completion {
        text,
        model: parsed
            .model
            .filter(|model| !model.trim().is_empty())
            .unwrap_or_else(|| requested_model.to_string()),
        usage: TokenUsage {
            input_tokens: usage.input_tokens.unwrap_or_default(),
            output_tokens: usage.output_tokens.unwrap_or_default(),
        },
    })
}

#[derive(Debug, Serialize)]
struct AnthropicApiRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicApiMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicApiMessage {
    role: &'static str,
    content: AnthropicApiContent,
}

impl From<Message> for AnthropicApiMessage {
    fn from(message: Message) -> Self {
        let content = match message.image {
            Some(image) => AnthropicApiContent::Blocks(vec![
                AnthropicApiBlock::Image {
                    source: AnthropicApiImageSource {
                        kind: "base64",
                        media_type: image.mime_type,
                        data: image.base64,
                    },
                },
                AnthropicApiBlock::Text {
                    text: message.content,
                },
            ]),
            None => AnthropicApiContent::Text(message.content),
        };

        Self {
            role: message.role.as_str(),
            content,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AnthropicApiContent {
    Text(String),
    Blocks(Vec<AnthropicApiBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicApiBlock {
    Text { text: String },
    Image { source: AnthropicApiImageSource },
}

#[derive(Debug, Serialize)]
struct AnthropicApiImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicApiResponse {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Option<Vec<AnthropicApiResponseBlock>>,
    #[serde(default)]
    usage: Option<AnthropicApiUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicApiResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AnthropicApiUsage {
    #[serde(default)]
    input_tokens: Option<u64>,
    #[serde(default)]
    output_tokens: Option<u64>,
}
