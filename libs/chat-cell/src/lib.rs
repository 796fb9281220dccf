pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;

pub use models::*;
pub use router::chat_routes;
pub use state::ChatState;

pub mod api {
    pub use crate::services::handler::ChatRequestHandler;
    pub use crate::services::llm::{client_from_config, ChatCompletionClient, OpenAiCompatibleClient, UnconfiguredClient};
    pub use crate::services::session::{ChatSession, ConversationService, SessionRegistry};
}
