use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_max_size: u32,
    pub pool_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RedisConfig {
    pub url: String,
    /// When false the in-process cache store is used instead of Redis
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    pub moderation_model: String,
    pub timeout_seconds: u64,
    pub temperature: f32,
    pub max_tokens: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub rate_limit_max_requests: u32,
    pub rate_limit_window_seconds: u64,
    /// Idle rate windows older than this are evicted by the sweeper
    pub rate_limit_idle_ttl_seconds: u64,
    pub faq_cache_ttl_seconds: u64,
    pub history_cache_ttl_seconds: u64,
    pub history_limit: usize,
    pub max_message_chars: usize,
    pub allowed_regions: Vec<String>,
    pub moderation_timeout_seconds: u64,
    pub generation_timeout_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            rate_limit_max_requests: 10,
            rate_limit_window_seconds: 60,
            rate_limit_idle_ttl_seconds: 600,
            faq_cache_ttl_seconds: 3600,
            history_cache_ttl_seconds: 900,
            history_limit: 10,
            max_message_chars: 2000,
            allowed_regions: vec![
                "USA".to_string(),
                "India".to_string(),
                "Japan".to_string(),
                "China".to_string(),
            ],
            moderation_timeout_seconds: 10,
            generation_timeout_seconds: 30,
            sweep_interval_seconds: 60,
        }
    }
}

impl ChatConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    pub fn faq_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.faq_cache_ttl_seconds)
    }

    pub fn history_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.history_cache_ttl_seconds)
    }

    pub fn moderation_timeout(&self) -> Duration {
        Duration::from_secs(self.moderation_timeout_seconds)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PromptsConfig {
    /// Must contain the `{{FAQ_CONTEXT}}` placeholder
    pub support_system_prompt: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            support_system_prompt: crate::services::chat::ResponseGenerator::default_system_prompt(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/settings").required(true))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("chat.allowed_regions"),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_defaults_match_documented_limits() {
        let chat = ChatConfig::default();
        assert_eq!(chat.rate_limit_max_requests, 10);
        assert_eq!(chat.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(chat.faq_cache_ttl(), Duration::from_secs(3600));
        assert_eq!(chat.history_cache_ttl(), Duration::from_secs(900));
        assert_eq!(chat.history_limit, 10);
        assert_eq!(chat.max_message_chars, 2000);
        assert_eq!(chat.allowed_regions.len(), 4);
    }

    #[test]
    fn test_default_prompt_has_placeholder() {
        let prompts = PromptsConfig::default();
        assert!(prompts.support_system_prompt.contains("{{FAQ_CONTEXT}}"));
    }
}
