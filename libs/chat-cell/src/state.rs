// libs/chat-cell/src/state.rs
use std::sync::Arc;
use std::time::Duration;

use appointment_cell::api::{AppointmentBookingService, AppointmentRepository};
use shared_config::AppConfig;

use crate::services::handler::ChatRequestHandler;
use crate::services::llm::ChatCompletionClient;
use crate::services::session::{ConversationService, SessionRegistry};

pub struct ChatState {
    pub handler: Arc<ChatRequestHandler>,
    pub conversations: ConversationService,
    pub sessions: SessionRegistry,
}

impl ChatState {
    pub fn new(
        config: &AppConfig,
        client: Arc<dyn ChatCompletionClient>,
        repository: Arc<AppointmentRepository>,
    ) -> Self {
        let handler = Arc::new(ChatRequestHandler::new(client, config));
        let booking = Arc::new(AppointmentBookingService::new(repository));

        Self {
            conversations: ConversationService::new(Arc::clone(&handler), booking, config.clinic_phone.clone()),
            handler,
            sessions: SessionRegistry::with_limits(
                Duration::from_secs(config.chat_session_ttl_secs),
                config.chat_max_sessions,
            ),
        }
    }
}
