use std::sync::Arc;

use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use appointment_cell::api::AppointmentRepository;
use appointment_cell::router::appointment_routes;
use chat_cell::api::ChatCompletionClient;
use chat_cell::{chat_routes, ChatState};
use doctor_cell::router::doctor_routes;
use shared_config::AppConfig;

#[derive(Clone)]
struct HealthState {
    config: Arc<AppConfig>,
    repository: Arc<AppointmentRepository>,
}

pub fn create_router(
    config: Arc<AppConfig>,
    repository: Arc<AppointmentRepository>,
    chat_client: Arc<dyn ChatCompletionClient>,
) -> Router {
    let chat_state = Arc::new(ChatState::new(&config, chat_client, Arc::clone(&repository)));
    let health_state = HealthState {
        config,
        repository: Arc::clone(&repository),
    };

    Router::new()
        .route("/", get(|| async { "Dezy Clinic API is running!" }))
        .route("/health", get(health).with_state(health_state))
        .nest("/api/doctors", doctor_routes())
        .nest("/api/appointments", appointment_routes(repository))
        .nest("/api/chat", chat_routes(chat_state))
}

async fn health(State(state): State<HealthState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "llmConfigured": state.config.is_llm_configured(),
        "storage": if state.config.is_redis_configured() { "redis" } else { "memory" },
        "storageSlot": state.repository.slot(),
        "appointments": state.repository.all().await.len(),
    }))
}
