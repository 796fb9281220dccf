use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chat_cell::api::{ChatCompletionClient, OpenAiCompatibleClient};
use chat_cell::models::{ChatError, ChatRole, CompletionRequest, TranscriptMessage};
use chat_cell::services::tool_definitions;
use shared_config::AppConfig;
use shared_utils::test_utils::{MockLlmResponses, TestConfig};

fn completion_request() -> CompletionRequest {
    CompletionRequest {
        model: "test-model".to_string(),
        messages: vec![TranscriptMessage {
            role: ChatRole::User,
            content: "Do you do rhinoplasty?".to_string(),
        }],
        tools: tool_definitions(),
        tool_choice: "auto".to_string(),
        temperature: 0.7,
        max_tokens: 500,
    }
}

fn client_for(server: &MockServer) -> OpenAiCompatibleClient {
    OpenAiCompatibleClient::new(&TestConfig::with_llm_base_url(&server.uri()).to_app_config()).unwrap()
}

#[tokio::test]
async fn test_posts_completion_with_bearer_auth() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-llm-key"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "tool_choice": "auto",
            "max_tokens": 500
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockLlmResponses::text_reply(
            "Yes, Dr. Marshall performs rhinoplasty.",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let message = client_for(&mock_server).complete(&completion_request()).await.unwrap();

    assert_eq!(message.content.as_deref(), Some("Yes, Dr. Marshall performs rhinoplasty."));
    assert!(message.tool_calls.is_none());
}

#[tokio::test]
async fn test_parses_tool_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockLlmResponses::tool_call_reply(
            "checkAvailability",
            json!({ "doctorId": "dr-loflin", "date": "2024-06-01" }),
        )))
        .mount(&mock_server)
        .await;

    let message = client_for(&mock_server).complete(&completion_request()).await.unwrap();

    let calls = message.tool_calls.expect("tool calls");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].function.name, "checkAvailability");
    assert!(calls[0].function.arguments.contains("dr-loflin"));
}

#[tokio::test]
async fn test_non_success_status_is_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(MockLlmResponses::error_response("Quota exceeded", 429)),
        )
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).complete(&completion_request()).await;

    assert_matches!(result, Err(ChatError::Upstream { status: 429, body }) if body.contains("Quota exceeded"));
}

#[tokio::test]
async fn test_empty_choices_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockLlmResponses::empty_choices()))
        .mount(&mock_server)
        .await;

    let result = client_for(&mock_server).complete(&completion_request()).await;

    assert_matches!(result, Err(ChatError::InvalidResponse(_)));
}

#[test]
fn test_unconfigured_client_is_rejected() {
    let result = OpenAiCompatibleClient::new(&AppConfig::default());

    assert_matches!(result, Err(ChatError::NotConfigured));
}
