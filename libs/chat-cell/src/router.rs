// libs/chat-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::ChatState;

pub fn chat_routes(state: Arc<ChatState>) -> Router {
    Router::new()
        .route("/", post(handlers::chat))
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/{session_id}", get(handlers::get_session))
        .route("/sessions/{session_id}/messages", post(handlers::post_session_message))
        .with_state(state)
}
