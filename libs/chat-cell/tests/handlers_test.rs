use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::api::AppointmentRepository;
use chat_cell::api::OpenAiCompatibleClient;
use chat_cell::{chat_routes, ChatState};
use shared_database::InMemoryKeyValueStore;
use shared_utils::test_utils::{MockLlmResponses, TestConfig};

fn create_test_app(server: &MockServer) -> (Router, Arc<AppointmentRepository>) {
    let config = TestConfig::with_llm_base_url(&server.uri()).to_app_config();
    let client = Arc::new(OpenAiCompatibleClient::new(&config).unwrap());
    let repository = Arc::new(AppointmentRepository::new(
        Arc::new(InMemoryKeyValueStore::new()),
        "chat-handlers-test",
    ));
    let state = Arc::new(ChatState::new(&config, client, Arc::clone(&repository)));

    (chat_routes(state), repository)
}

async fn mock_completion(server: &MockServer, body: Value) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(raw) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(raw)
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

fn existing_marshall_appointment() -> Value {
    json!({
        "id": "7f0c6a9e-2b3d-4c55-9e61-0a1b2c3d4e5f",
        "patientName": "Jane Doe",
        "patientAge": 34,
        "patientPhone": "555-0100",
        "doctorId": "dr-marshall",
        "date": "2024-06-01",
        "time": "10:00",
        "status": "confirmed"
    })
}

#[tokio::test]
async fn test_chat_returns_plain_reply() {
    let server = MockServer::start().await;
    mock_completion(&server, MockLlmResponses::text_reply("Hello! How can I help?")).await;
    let (app, _) = create_test_app(&server);

    let body = json!({ "messages": [{ "role": "user", "content": "Hi" }], "appointments": [] });
    let (status, response) = send(&app, Method::POST, "/", Some(body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "content": "Hello! How can I help?", "functionCall": null }));
}

#[tokio::test]
async fn test_chat_rejects_booking_into_held_slot() {
    let server = MockServer::start().await;
    mock_completion(
        &server,
        MockLlmResponses::tool_call_reply(
            "bookAppointment",
            MockLlmResponses::booking_arguments("dr-marshall", "2024-06-01", "10:00"),
        ),
    )
    .await;
    let (app, repository) = create_test_app(&server);

    let body = json!({
        "messages": [{ "role": "user", "content": "Book Dr. Marshall June 1 at 10" }],
        "appointments": [existing_marshall_appointment()]
    });
    let (status, response) = send(&app, Method::POST, "/", Some(body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert!(response["functionCall"].is_null());
    let content = response["content"].as_str().unwrap();
    assert!(content.contains("Andre P. Marshall"));
    assert!(content.contains("09:00, 09:30, 10:30"));
    assert!(repository.all().await.is_empty());
}

#[tokio::test]
async fn test_chat_accepts_snapshot_with_client_generated_ids() {
    let server = MockServer::start().await;
    mock_completion(
        &server,
        MockLlmResponses::tool_call_reply(
            "bookAppointment",
            MockLlmResponses::booking_arguments("dr-marshall", "2024-06-01", "10:00"),
        ),
    )
    .await;
    let (app, _) = create_test_app(&server);

    let mut existing = existing_marshall_appointment();
    existing["id"] = json!("apt-1");
    existing["patientAge"] = json!(34.0);
    let body = json!({
        "messages": [{ "role": "user", "content": "Book Dr. Marshall June 1 at 10" }],
        "appointments": [existing]
    });
    let (status, response) = send(&app, Method::POST, "/", Some(body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert!(response["functionCall"].is_null());
    assert!(response["content"].as_str().unwrap().contains("Andre P. Marshall"));
}

#[tokio::test]
async fn test_chat_books_with_float_age_from_model() {
    let server = MockServer::start().await;
    let mut arguments = MockLlmResponses::booking_arguments("dr-loflin", "2024-06-01", "11:00");
    arguments["patientAge"] = json!(41.0);
    mock_completion(&server, MockLlmResponses::tool_call_reply("bookAppointment", arguments)).await;
    let (app, _) = create_test_app(&server);

    let body = json!({ "messages": [{ "role": "user", "content": "Book Dr. Loflin at 11" }], "appointments": [] });
    let (status, response) = send(&app, Method::POST, "/", Some(body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["functionCall"]["name"], "bookAppointment");
}

#[tokio::test]
async fn test_chat_passes_free_booking_through_as_action() {
    let server = MockServer::start().await;
    mock_completion(
        &server,
        MockLlmResponses::tool_call_reply(
            "bookAppointment",
            MockLlmResponses::booking_arguments("dr-loflin", "2024-06-01", "09:00"),
        ),
    )
    .await;
    let (app, repository) = create_test_app(&server);

    let body = json!({ "messages": [{ "role": "user", "content": "Book Dr. Loflin at 9" }], "appointments": [] });
    let (status, response) = send(&app, Method::POST, "/", Some(body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["functionCall"]["name"], "bookAppointment");
    let arguments: Value =
        serde_json::from_str(response["functionCall"]["arguments"].as_str().unwrap()).unwrap();
    assert_eq!(arguments["doctorId"], "dr-loflin");
    assert_eq!(arguments["time"], "09:00");
    // The stateless endpoint never commits.
    assert!(repository.all().await.is_empty());
}

#[tokio::test]
async fn test_chat_model_failure_is_generic_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;
    let (app, _) = create_test_app(&server);

    let body = json!({ "messages": [{ "role": "user", "content": "Hi" }] });
    let (status, response) = send(&app, Method::POST, "/", Some(body.to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, json!({ "error": "Failed to process chat request" }));
}

#[tokio::test]
async fn test_chat_malformed_body_is_generic_error() {
    let server = MockServer::start().await;
    let (app, _) = create_test_app(&server);

    let (status, response) = send(&app, Method::POST, "/", Some("{not json".to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["error"], "Failed to process chat request");
}

#[tokio::test]
async fn test_session_flow_books_appointment() {
    let server = MockServer::start().await;
    mock_completion(
        &server,
        MockLlmResponses::tool_call_reply(
            "bookAppointment",
            MockLlmResponses::booking_arguments("dr-loflin", "2024-06-01", "09:00"),
        ),
    )
    .await;
    let (app, repository) = create_test_app(&server);

    let (status, session) = send(&app, Method::POST, "/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(session["messages"].as_array().unwrap().len(), 1);
    let session_id = session["id"].as_str().unwrap().to_string();

    let (status, turn) = send(
        &app,
        Method::POST,
        &format!("/sessions/{}/messages", session_id),
        Some(json!({ "content": "Book me with Dr. Loflin at 9" }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let appended = turn["messages"].as_array().unwrap();
    assert_eq!(appended.len(), 2);
    assert_eq!(appended[0]["role"], "user");
    assert!(appended[1]["content"].as_str().unwrap().contains("Catherine Loflin"));
    assert_eq!(repository.all().await.len(), 1);

    let (status, fetched) = send(&app, Method::GET, &format!("/sessions/{}", session_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["messages"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_session_rejects_empty_message() {
    let server = MockServer::start().await;
    let (app, _) = create_test_app(&server);

    let (_, session) = send(&app, Method::POST, "/sessions", None).await;
    let session_id = session["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/sessions/{}/messages", session_id),
        Some(json!({ "content": "" }).to_string()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let server = MockServer::start().await;
    let (app, _) = create_test_app(&server);

    let (status, _) = send(
        &app,
        Method::GET,
        "/sessions/00000000-0000-0000-0000-000000000000",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
