//! Chat-completions provider shared by the OpenAI-compatible families.

use std::sync::Arc;

use serde_json::Value;

use crate::adapters::reply::{RejectedReply, accept_reply};
use crate::{
    Completion, HttpRequest, HttpTransport, ModelProvider, ModelRequest, ProviderError,
    ProviderFuture, ProviderId, RequestOutcome, SecureCredentialManager, TokenUsage,
};

use super::profile::{ChatCompletionsProfile, ModelSource};
use super::serde_api::{ChatCompletionsApiResponse, build_api_request};

#[derive(Clone)]
pub struct ChatCompletionsProvider {
    profile: ChatCompletionsProfile,
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn HttpTransport>,
}

impl ChatCompletionsProvider {
    pub fn new(
        profile: ChatCompletionsProfile,
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            profile,
            credentials,
            transport,
        }
    }

    pub fn profile(&self) -> &ChatCompletionsProfile {
        &self.profile
    }

    fn endpoint(&self) -> Result<String, ProviderError> {
        if let Some(url) = self.credentials.endpoint(self.profile.provider)? {
            return Ok(url);
        }

        self.profile
            .default_url
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::configuration(format!(
                    "no api url defined for {}",
                    self.profile.provider
                ))
            })
    }

    fn http_request(&self, body: Value) -> Result<HttpRequest, ProviderError> {
        let request = HttpRequest::new(self.endpoint()?, body);
        let api_key = self.credentials.api_key(self.profile.provider)?;

        match api_key {
            Some(key) => Ok(request.bearer_auth(&key)),
            None if self.profile.api_key_required => Err(ProviderError::configuration(format!(
                "no {} api key configured",
                self.profile.provider
            ))),
            None => Ok(request),
        }
    }

    fn interpret(&self, requested_model: &str, body: Value) -> Result<Completion, RejectedReply> {
        let reject = |error: ProviderError, body: Value| RejectedReply {
            error,
            response_data: Some(body),
        };

        let parsed = match serde_json::from_value::<ChatCompletionsApiResponse>(body.clone()) {
            Ok(parsed) => parsed,
            Err(err) => {
                return Err(reject(
                    ProviderError::malformed_body(format!(
                        "{} reply has an unexpected shape: {err}",
                        self.profile.provider
                    )),
                    body,
                ));
            }
        };

        let Some(choice) = parsed.choices.unwrap_or_default().into_iter().next() else {
            return Err(reject(
                ProviderError::no_answer(format!("{} returned no choices", self.profile.provider)),
                body,
            ));
        };

        let text = choice
            .message
            .and_then(|message| message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(reject(
                ProviderError::empty_answer(format!(
                    "{} returned an empty answer",
                    self.profile.provider
                )),
                body,
            ));
        }

        let model = match self.profile.model_source {
            ModelSource::Response => parsed
                .model
                .filter(|model| !model.trim().is_empty())
                .unwrap_or_else(|| requested_model.to_string()),
            ModelSource::Request => requested_model.to_string(),
        };
        let usage = parsed.usage.unwrap_or_default();

        Ok(Completion {
            text,
            model,
            usage: TokenUsage {
                input_tokens: usage.prompt_tokens.unwrap_or_default(),
                output_tokens: usage.completion_tokens.unwrap_or_default(),
            },
        })
    }
}

impl ModelProvider for ChatCompletionsProvider {
    fn id(&self) -> ProviderId {
        self.profile.provider
    }

    fn check_credential(&self) -> bool {
        let has_endpoint = self.endpoint().is_ok();
        let has_key = !self.profile.api_key_required
            || self
                .credentials
                .has_api_key(self.profile.provider)
                .unwrap_or(false);

        has_endpoint && has_key
    }

    fn request<'a>(&'a self, request: ModelRequest) -> ProviderFuture<'a, RequestOutcome> {
        Box::pin(async move {
            if let Err(error) = request.validate() {
                return RequestOutcome::failure(error, None, None);
            }

            let requested_model = request.model.clone();
            let api_request = build_api_request(&self.profile, request);
            let request_data = match serde_json::to_value(&api_request) {
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

            let outcome = accept_reply(self.profile.provider, &reply, self.profile.status_overrides)
                .and_then(|body| {
                    let completion = self.interpret(&requested_model, body.clone())?;
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
