#![cfg(feature = "provider-anthropic")]

use std::sync::{Arc, Mutex};

use serde_json::json;
use tprovider::adapters::anthropic::{ANTHROPIC_MESSAGES_URL, AnthropicProvider};
use tprovider::{
    HttpReply, HttpRequest, HttpTransport, Message, ModelProvider, ModelRequest, ProviderError,
    ProviderErrorKind, ProviderFuture, SecureCredentialManager,
};

#[derive(Debug)]
struct FakeTransport {
    reply: HttpReply,
    captured_request: Mutex<Option<HttpRequest>>,
}

impl FakeTransport {
    fn new(reply: HttpReply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            captured_request: Mutex::new(None),
        })
    }

    fn captured(&self) -> HttpRequest {
        self.captured_request
            .lock()
            .expect("request lock")
            .clone()
            .expect("request should be captured")
    }
}

impl HttpTransport for FakeTransport {
    fn post_json<'a>(
        &'a self,
        request: HttpRequest,
    ) -> ProviderFuture<'a, Result<HttpReply, ProviderError>> {
        Box::pin(async move {
            *self.captured_request.lock().expect("request lock") = Some(request);
            Ok(self.reply.clone())
        })
    }
}

fn credentials() -> Arc<SecureCredentialManager> {
    let credentials = Arc::new(SecureCredentialManager::new());
    credentials
        .set_anthropic_api_key("sk-ant-test")
        .expect("key should set");
    credentials
}

#[tokio::test]
async fn request_maps_messages_api_reply_to_completion() {
    let transport = FakeTransport::new(HttpReply::new(
        200,
        json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-3-5-haiku-20241022",
            "content": [{"type": "text", "text": "Sunny all day."}],
            "usage": {"input_tokens": 21, "output_tokens": 5}
        })
        .to_string(),
    ));
    let provider = AnthropicProvider::new(credentials(), transport.clone());
    assert!(provider.check_credential());

    let request = ModelRequest::builder("claude-3-5-haiku")
        .message(Message::user("weather?"))
        .system_prompt("You are a forecaster")
        .temperature(0.2)
        .build()
        .expect("request should build");

    let outcome = provider.request(request).await;
    let completion = outcome.result.clone().expect("request should succeed");
    assert_eq!(completion.text, "Sunny all day.");
    assert_eq!(completion.model, "claude-3-5-haiku-20241022");
    assert_eq!(completion.usage.input_tokens, 21);
    assert_eq!(completion.usage.output_tokens, 5);

    let sent = transport.captured();
    assert_eq!(sent.url, ANTHROPIC_MESSAGES_URL);
    assert_eq!(sent.header_value("x-api-key"), Some("sk-ant-test"));
    assert_eq!(sent.header_value("anthropic-version"), Some("2023-06-01"));
    assert_eq!(sent.header_value("authorization"), None);
    assert_eq!(sent.body["system"], json!("You are a forecaster"));
    assert_eq!(sent.body["messages"], json!([{"role": "user", "content": "weather?"}]));
    assert_eq!(outcome.request_data, Some(sent.body));
}

#[tokio::test]
async fn overloaded_status_is_retryable() {
    let transport = FakeTransport::new(HttpReply::new(
        529,
        r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
    ));
    let provider = AnthropicProvider::new(credentials(), transport);

    let outcome = provider
        .request(ModelRequest::new("claude", vec![Message::user("hi")]))
        .await;
    let error = outcome.result.expect_err("529 should fail");
    assert_eq!(error.kind, ProviderErrorKind::Overloaded);
    assert_eq!(error.message, "Overloaded");
    assert!(error.retryable);
    assert!(outcome.response_data.is_some());
}

#[tokio::test]
async fn embedded_error_on_success_status_is_rejected() {
    let transport = FakeTransport::new(HttpReply::new(
        200,
        r#"{"type":"error","error":{"type":"api_error","message":"internal"}}"#,
    ));
    let provider = AnthropicProvider::new(credentials(), transport);

    let error = provider
        .request(ModelRequest::new("claude", vec![Message::user("hi")]))
        .await
        .result
        .expect_err("embedded error should fail");
    assert_eq!(error.kind, ProviderErrorKind::EmbeddedError);
    assert_eq!(error.message, "internal");
}

#[tokio::test]
async fn missing_key_fails_without_calling_transport() {
    let transport = FakeTransport::new(HttpReply::new(200, "{}"));
    let provider = AnthropicProvider::new(Arc::new(SecureCredentialManager::new()), transport.clone());
    assert!(!provider.check_credential());

    let outcome = provider
        .request(ModelRequest::new("claude", vec![Message::user("hi")]))
        .await;
    let error = outcome.result.expect_err("missing key should fail");
    assert_eq!(error.kind, ProviderErrorKind::Configuration);
    assert!(transport.captured_request.lock().expect("request lock").is_none());
}
