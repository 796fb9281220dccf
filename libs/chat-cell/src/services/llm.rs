// libs/chat-cell/src/services/llm.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;

use crate::models::{AssistantMessage, ChatError, CompletionRequest, CompletionResponse};

/// A chat-completions model. The handler only ever consumes the first
/// choice of a completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<AssistantMessage, ChatError>;
}

/// Stand-in used when no model credentials are configured. Every request
/// fails with `ChatError::NotConfigured`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredClient;

#[async_trait]
impl ChatCompletionClient for UnconfiguredClient {
    async fn complete(&self, _request: &CompletionRequest) -> Result<AssistantMessage, ChatError> {
        Err(ChatError::NotConfigured)
    }
}

/// Client for any provider exposing an OpenAI-compatible
/// `POST {base}/chat/completions` endpoint.
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleClient {
    pub fn new(config: &AppConfig) -> Result<Self, ChatError> {
        if !config.is_llm_configured() {
            return Err(ChatError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.llm_base_url.trim_end_matches('/').to_string(),
            api_key: config.llm_api_key.clone(),
        })
    }
}

#[async_trait]
impl ChatCompletionClient for OpenAiCompatibleClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<AssistantMessage, ChatError> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            "Sending completion request to {} ({} messages, model {})",
            url,
            request.messages.len(),
            request.model
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!("Chat completion failed: {} - {}", status, response_text);
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body: response_text,
            });
        }

        let completion: CompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| ChatError::InvalidResponse(format!("Failed to parse completion: {}", e)))?;

        let message = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ChatError::InvalidResponse("Completion contained no choices".to_string()))?;

        info!(
            "Chat completion received ({} tool calls)",
            message.tool_calls.as_ref().map_or(0, Vec::len)
        );

        Ok(message)
    }
}

/// Builds the configured model client, falling back to `UnconfiguredClient`
/// so the rest of the API stays usable without credentials.
pub fn client_from_config(config: &AppConfig) -> Result<Arc<dyn ChatCompletionClient>, ChatError> {
    match OpenAiCompatibleClient::new(config) {
        Ok(client) => Ok(Arc::new(client)),
        Err(ChatError::NotConfigured) => {
            warn!("Chat model credentials missing, chat requests will fail");
            Ok(Arc::new(UnconfiguredClient))
        }
        Err(e) => Err(e),
    }
}
