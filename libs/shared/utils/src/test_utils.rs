use std::sync::Arc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;

pub struct TestConfig {
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub storage_slot: String,
    pub clinic_phone: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            llm_base_url: "http://localhost:4010/v1".to_string(),
            llm_api_key: "test-llm-key".to_string(),
            llm_model: "test-model".to_string(),
            storage_slot: "test-appointments".to_string(),
            clinic_phone: "(555) 123-4567".to_string(),
        }
    }
}

impl TestConfig {
    /// Points the model client at a mock server, e.g. `wiremock::MockServer::uri()`.
    pub fn with_llm_base_url(base_url: &str) -> Self {
        Self {
            llm_base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            llm_base_url: self.llm_base_url.clone(),
            llm_api_key: self.llm_api_key.clone(),
            llm_model: self.llm_model.clone(),
            llm_timeout_secs: 5,
            storage_slot: self.storage_slot.clone(),
            clinic_phone: self.clinic_phone.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Chat-completions payloads in the shape an OpenAI-compatible provider returns.
pub struct MockLlmResponses;

impl MockLlmResponses {
    pub fn text_reply(content: &str) -> Value {
        json!({
            "id": format!("chatcmpl-{}", Uuid::new_v4()),
            "object": "chat.completion",
            "created": 1717200000,
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": content
                },
                "finish_reason": "stop"
            }]
        })
    }

    pub fn tool_call_reply(name: &str, arguments: Value) -> Value {
        json!({
            "id": format!("chatcmpl-{}", Uuid::new_v4()),
            "object": "chat.completion",
            "created": 1717200000,
            "model": "test-model",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": format!("call_{}", Uuid::new_v4().simple()),
                        "type": "function",
                        "function": {
                            "name": name,
                            "arguments": arguments.to_string()
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })
    }

    pub fn empty_choices() -> Value {
        json!({
            "id": "chatcmpl-empty",
            "object": "chat.completion",
            "choices": []
        })
    }

    pub fn error_response(message: &str, code: u16) -> Value {
        json!({
            "error": {
                "message": message,
                "code": code
            }
        })
    }

    pub fn booking_arguments(doctor_id: &str, date: &str, time: &str) -> Value {
        json!({
            "patientName": "John Smith",
            "patientAge": 41,
            "patientPhone": "555-0199",
            "doctorId": doctor_id,
            "date": date,
            "time": time,
            "treatment": "Rhinoplasty"
        })
    }
}
