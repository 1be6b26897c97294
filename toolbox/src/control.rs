//! Message-style control surface.
//!
//! Commands arrive as JSON objects tagged by `command`. Replies serialize
//! untagged: a bare string for tool answers, an outcome object for raw model
//! requests, the picker list for `get_available_models` and `{"reason": ..}`
//! for failures.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tchat::{RequestOrchestrator, ToolId, ToolRequest};
use tcommon::GenerationOptions;
use tprovider::{ImageAttachment, Message, ModelChoice, ModelRequest, RequestOutcome, Role};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    /// One attempt against a configured tool; retries do not apply.
    ToolRequest {
        #[serde(default)]
        tool: String,
        #[serde(default)]
        text: String,
        /// `data:` URL of an image to attach.
        #[serde(default)]
        image_url: Option<String>,
    },
    ModelRequest {
        #[serde(default)]
        model: String,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        messages: Vec<ControlMessage>,
        #[serde(default)]
        system_prompt: Option<String>,
        #[serde(default)]
        max_tokens: Option<u32>,
        #[serde(default)]
        temperature: Option<f32>,
    },
    #[serde(alias = "getAvailableModels")]
    GetAvailableModels,
    ClearHistory {
        #[serde(default)]
        tool: String,
    },
}

impl ControlCommand {
    pub fn from_json(value: Value) -> Result<Self, crate::ToolboxError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Successful raw model answer with the payloads exchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeView {
    pub text: String,
    pub model: String,
    pub tokens_input: u64,
    pub tokens_output: u64,
    pub request_data: Option<Value>,
    pub response_data: Option<Value>,
}

impl OutcomeView {
    fn from_outcome(outcome: RequestOutcome) -> Option<Self> {
        let completion = outcome.result.ok()?;
        Some(Self {
            text: completion.text,
            model: completion.model,
            tokens_input: completion.usage.input_tokens,
            tokens_output: completion.usage.output_tokens,
            request_data: outcome.request_data,
            response_data: outcome.response_data,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ControlReply {
    Text(String),
    Outcome(OutcomeView),
    Models(Vec<ModelChoice>),
    Cleared,
    Failed { reason: String },
}

impl ControlReply {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

pub async fn dispatch(orchestrator: &RequestOrchestrator, command: ControlCommand) -> ControlReply {
    match command {
        ControlCommand::ToolRequest {
            tool,
            text,
            image_url,
        } => tool_request(orchestrator, &tool, text, image_url).await,
        ControlCommand::ModelRequest {
            model,
            text,
            messages,
            system_prompt,
            max_tokens,
            temperature,
        } => {
            let options = GenerationOptions::default().with_overrides(temperature, max_tokens);
            model_request(orchestrator, model, text, messages, system_prompt, options).await
        }
        ControlCommand::GetAvailableModels => {
            ControlReply::Models(orchestrator.registry().available_models())
        }
        ControlCommand::ClearHistory { tool } => {
            match orchestrator.clear_history(&ToolId::normalize(&tool)).await {
                Ok(()) => ControlReply::Cleared,
                Err(error) => ControlReply::failed(error.to_string()),
            }
        }
    }
}

async fn tool_request(
    orchestrator: &RequestOrchestrator,
    tool: &str,
    text: String,
    image_url: Option<String>,
) -> ControlReply {
    if tool.trim().is_empty() || text.trim().is_empty() {
        tracing::warn!(command = "tool_request", "missing or empty parameters");
        return ControlReply::failed("missing or empty parameters");
    }

    let image = match image_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
        None => None,
        Some(url) => match ImageAttachment::from_data_url(url) {
            Some(image) => Some(image),
            None => {
                tracing::warn!(command = "tool_request", "image_url is not a base64 data url");
                return ControlReply::failed("image_url must be a base64 data: URL");
            }
        },
    };

    let id = ToolId::normalize(tool);
    if orchestrator.tool(&id).is_none() {
        tracing::warn!(command = "tool_request", tool = %id, "tool not found");
        return ControlReply::failed(format!("tool '{id}' not found"));
    }

    let request = ToolRequest::new(id, text).with_image(image).single_shot();
    match orchestrator.start_request(request).await {
        Ok(reply) => ControlReply::Text(reply.completion.text),
        Err(error) => ControlReply::failed(error.to_string()),
    }
}

async fn model_request(
    orchestrator: &RequestOrchestrator,
    model: String,
    text: Option<String>,
    messages: Vec<ControlMessage>,
    system_prompt: Option<String>,
    options: GenerationOptions,
) -> ControlReply {
    let messages = if messages.is_empty() {
        text.filter(|text| !text.trim().is_empty())
            .map(|text| vec![Message::user(text)])
            .unwrap_or_default()
    } else {
        messages
            .into_iter()
            .map(|message| Message::new(message.role, message.content))
            .collect()
    };

    let request = ModelRequest::new(model, messages)
        .with_options(options)
        .with_system_prompt(system_prompt.filter(|prompt| !prompt.trim().is_empty()));

    match orchestrator.start_model_request(request).await {
        Ok(outcome) => OutcomeView::from_outcome(outcome)
            .map(ControlReply::Outcome)
            .unwrap_or_else(|| ControlReply::failed("model request returned no answer")),
        Err(error) => ControlReply::failed(error.to_string()),
    }
}
