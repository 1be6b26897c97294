#![cfg(all(feature = "reqwest-transport", feature = "provider-custom"))]

use httptest::{Expectation, Server, matchers::*, responders::*};
use serde_json::json;
use toolbox::{ControlCommand, ControlReply, ModelChoice, ToolId, ToolboxConfig, ToolboxRuntime};

fn runtime_for(server: &Server) -> ToolboxRuntime {
    let config = ToolboxConfig::from_json_str(
        &json!({
            "tools": [{
                "name": "Helper",
                "model": "local-llm",
                "system_prompt": "Answer briefly.",
                "chat_history": 2
            }],
            "custom_models": [{"name": "local-llm"}],
            "openai_models": [{"name": "gpt-4o", "active": false}],
            "custom_api_url": server.url_str("/v1/chat/completions"),
            "state": {"kind": "in_memory"}
        })
        .to_string(),
    )
    .expect("config should parse");

    ToolboxRuntime::from_config(&config).expect("runtime should build")
}

fn completion(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}],
        "usage": {"prompt_tokens": 7, "completion_tokens": 3}
    })
}

#[tokio::test]
async fn tool_request_answers_and_records_history() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
            .respond_with(json_encoded(completion("integration-ok"))),
    );
    let runtime = runtime_for(&server);

    let reply = runtime
        .handle(ControlCommand::ToolRequest {
            tool: "Helper".to_string(),
            text: "ping".to_string(),
            image_url: None,
        })
        .await;

    assert_eq!(reply, ControlReply::Text("integration-ok".to_string()));
    let history = runtime
        .orchestrator()
        .history(&ToolId::normalize("Helper"))
        .await;
    assert_eq!(history.len(), 1);
    assert_eq!(history.messages[0].user, "ping");
    assert_eq!(history.messages[0].tokens_input, 7);
}

#[tokio::test]
async fn tool_request_is_single_shot_on_server_errors() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
            .times(1)
            .respond_with(status_code(500).body("upstream exploded")),
    );
    let runtime = runtime_for(&server);

    let reply = runtime
        .handle(ControlCommand::ToolRequest {
            tool: "Helper".to_string(),
            text: "ping".to_string(),
            image_url: None,
        })
        .await;

    assert!(reply.is_failed());
    assert!(
        runtime
            .orchestrator()
            .history(&ToolId::normalize("Helper"))
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn model_request_returns_the_full_outcome() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("POST", "/v1/chat/completions"))
            .respond_with(json_encoded(completion("raw-answer"))),
    );
    let runtime = runtime_for(&server);

    let reply = runtime
        .handle(ControlCommand::ModelRequest {
            model: "local-llm".to_string(),
            text: Some("hello".to_string()),
            messages: Vec::new(),
            system_prompt: None,
            max_tokens: Some(64),
            temperature: None,
        })
        .await;

    let ControlReply::Outcome(outcome) = reply else {
        panic!("expected an outcome, got {reply:?}");
    };
    assert_eq!(outcome.text, "raw-answer");
    assert_eq!(outcome.tokens_output, 3);
    let request_data = outcome.request_data.expect("request payload");
    assert_eq!(request_data["max_tokens"], json!(64));
}

#[tokio::test]
async fn requests_that_never_reach_the_network() {
    let server = Server::run();
    let runtime = runtime_for(&server);

    let missing_text = runtime
        .handle(ControlCommand::ToolRequest {
            tool: "Helper".to_string(),
            text: "  ".to_string(),
            image_url: None,
        })
        .await;
    assert_eq!(missing_text, ControlReply::failed("missing or empty parameters"));

    let remote_image = runtime
        .handle(ControlCommand::ToolRequest {
            tool: "Helper".to_string(),
            text: "look".to_string(),
            image_url: Some("https://example.com/cat.png".to_string()),
        })
        .await;
    assert!(remote_image.is_failed());

    let unknown = runtime
        .handle(ControlCommand::ToolRequest {
            tool: "Nobody".to_string(),
            text: "hi".to_string(),
            image_url: None,
        })
        .await;
    assert_eq!(unknown, ControlReply::failed("tool 'Nobody' not found"));

    let models = runtime.handle(ControlCommand::GetAvailableModels).await;
    assert_eq!(
        models,
        ControlReply::Models(vec![
            ModelChoice {
                label: "gpt-4o".to_string(),
                value: "gpt-4o".to_string(),
            },
            ModelChoice {
                label: "local-llm".to_string(),
                value: "local-llm".to_string(),
            },
        ])
    );

    let cleared = runtime
        .handle(ControlCommand::ClearHistory {
            tool: "Helper".to_string(),
        })
        .await;
    assert_eq!(cleared, ControlReply::Cleared);

    let unknown_clear = runtime
        .handle(ControlCommand::ClearHistory {
            tool: "Nobody".to_string(),
        })
        .await;
    assert!(unknown_clear.is_failed());

    assert_eq!(runtime.shutdown(), 0);
}
