use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_STORAGE_SLOT: &str = "dezy-appointments";
pub const DEFAULT_CLINIC_PHONE: &str = "(555) 123-4567";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    pub redis_url: Option<String>,
    pub storage_slot: String,
    pub clinic_phone: String,
    pub chat_session_ttl_secs: u64,
    pub chat_max_sessions: usize,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm_base_url: DEFAULT_LLM_BASE_URL.to_string(),
            llm_api_key: String::new(),
            llm_model: String::new(),
            llm_timeout_secs: 90,
            llm_temperature: 0.7,
            llm_max_tokens: 500,
            redis_url: None,
            storage_slot: DEFAULT_STORAGE_SLOT.to_string(),
            clinic_phone: DEFAULT_CLINIC_PHONE.to_string(),
            chat_session_ttl_secs: 30 * 60,
            chat_max_sessions: 1000,
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            llm_base_url: env::var("LLM_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("LLM_BASE_URL not set, using default");
                    defaults.llm_base_url.clone()
                }),
            llm_api_key: env::var("LLM_API_KEY")
                .or_else(|_| env::var("GEMINI_API_KEY"))
                .unwrap_or_else(|_| {
                    warn!("LLM_API_KEY not set, using empty value");
                    String::new()
                }),
            llm_model: env::var("LLM_MODEL")
                .unwrap_or_else(|_| {
                    warn!("LLM_MODEL not set, using empty value");
                    String::new()
                }),
            llm_timeout_secs: parse_or("LLM_TIMEOUT_SECS", defaults.llm_timeout_secs),
            llm_temperature: parse_or("LLM_TEMPERATURE", defaults.llm_temperature),
            llm_max_tokens: parse_or("LLM_MAX_TOKENS", defaults.llm_max_tokens),
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            storage_slot: env::var("STORAGE_SLOT")
                .unwrap_or_else(|_| defaults.storage_slot.clone()),
            clinic_phone: env::var("CLINIC_PHONE")
                .unwrap_or_else(|_| defaults.clinic_phone.clone()),
            chat_session_ttl_secs: parse_or("CHAT_SESSION_TTL_SECS", defaults.chat_session_ttl_secs),
            chat_max_sessions: parse_or("CHAT_MAX_SESSIONS", defaults.chat_max_sessions),
            port: parse_or("PORT", defaults.port),
        };

        if !config.is_llm_configured() {
            warn!("Chat model not fully configured - missing environment variables");
        }

        if config.redis_url.is_none() {
            warn!("REDIS_URL not set, appointments will only be kept in memory");
        }

        config
    }

    pub fn is_llm_configured(&self) -> bool {
        !self.llm_base_url.is_empty()
            && !self.llm_api_key.is_empty()
            && !self.llm_model.is_empty()
    }

    pub fn is_redis_configured(&self) -> bool {
        self.redis_url.is_some()
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
