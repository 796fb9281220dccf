// libs/chat-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{ChatError, ChatRequest, ChatResponse, SessionMessageRequest};
use crate::state::ChatState;

pub const CHAT_FAILURE_MESSAGE: &str = "Failed to process chat request";

impl From<ChatError> for AppError {
    fn from(error: ChatError) -> Self {
        match error {
            ChatError::EmptyMessage => AppError::BadRequest(error.to_string()),
            ChatError::Busy => AppError::TooManyRequests(error.to_string()),
            ChatError::SessionNotFound(_) => AppError::NotFound(error.to_string()),
            other => {
                error!("Chat request failed: {}", other);
                AppError::Internal(CHAT_FAILURE_MESSAGE.to_string())
            }
        }
    }
}

/// Stateless turn: the caller supplies the transcript and its appointment
/// list and commits any returned action itself.
pub async fn chat(
    State(state): State<Arc<ChatState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        error!("Rejected chat request body: {}", rejection);
        AppError::Internal(CHAT_FAILURE_MESSAGE.to_string())
    })?;

    let response = state.handler.handle(request).await?;
    Ok(Json(response))
}

pub async fn create_session(
    State(state): State<Arc<ChatState>>,
) -> (StatusCode, Json<Value>) {
    let session = state.sessions.create().await;
    let snapshot = session.snapshot().await;

    (StatusCode::CREATED, Json(json!(snapshot)))
}

pub async fn get_session(
    State(state): State<Arc<ChatState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let session = state.sessions.get(session_id).await?;
    Ok(Json(json!(session.snapshot().await)))
}

pub async fn post_session_message(
    State(state): State<Arc<ChatState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SessionMessageRequest>,
) -> Result<Json<Value>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let appended = state.conversations.submit(&session, &request.content).await?;

    Ok(Json(json!({
        "sessionId": session_id,
        "messages": appended
    })))
}
