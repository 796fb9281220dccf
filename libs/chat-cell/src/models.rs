// libs/chat-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentError};

// ==============================================================================
// CONVERSATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
            ChatRole::System => write!(f, "system"),
        }
    }
}

/// An entry of a conversation transcript. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            function_call: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }

    pub fn with_function_call(mut self, function_call: FunctionCall) -> Self {
        self.function_call = Some(function_call);
        self
    }

    pub fn to_transcript(&self) -> TranscriptMessage {
        TranscriptMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: ChatRole,
    pub content: String,
}

// ==============================================================================
// CHAT ENDPOINT MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<TranscriptMessage>,
    #[serde(default)]
    pub appointments: Vec<Appointment>,
}

/// An action for the caller to carry out, with its JSON-encoded arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub content: String,
    pub function_call: Option<FunctionCall>,
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            function_call: None,
        }
    }

    pub fn action(content: impl Into<String>, function_call: FunctionCall) -> Self {
        Self {
            content: content.into(),
            function_call: Some(function_call),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionMessageRequest {
    pub content: String,
}

// ==============================================================================
// TOOLS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    BookAppointment,
    CancelAppointment,
    RescheduleAppointment,
    CheckAvailability,
    GetAppointmentDetails,
}

impl ToolName {
    pub const ALL: [ToolName; 5] = [
        ToolName::BookAppointment,
        ToolName::CancelAppointment,
        ToolName::RescheduleAppointment,
        ToolName::CheckAvailability,
        ToolName::GetAppointmentDetails,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::BookAppointment => "bookAppointment",
            ToolName::CancelAppointment => "cancelAppointment",
            ToolName::RescheduleAppointment => "rescheduleAppointment",
            ToolName::CheckAvailability => "checkAvailability",
            ToolName::GetAppointmentDetails => "getAppointmentDetails",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAvailabilityArgs {
    pub doctor_id: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetailsArgs {
    #[serde(default)]
    pub patient_phone: Option<String>,
}

// ==============================================================================
// CHAT COMPLETIONS WIRE FORMAT
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<TranscriptMessage>,
    pub tools: Vec<Value>,
    pub tool_choice: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    pub message: AssistantMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: Option<String>,
    pub function: ToolFunction,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Chat model is not configured")]
    NotConfigured,

    #[error("Chat model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Chat model returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid chat model response: {0}")]
    InvalidResponse(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("A message is already being processed for this conversation")]
    Busy,

    #[error("Conversation {0} not found")]
    SessionNotFound(Uuid),

    #[error(transparent)]
    Booking(#[from] AppointmentError),
}
