pub mod settings;

pub use settings::{
    ChatConfig, DatabaseConfig, LlmConfig, PromptsConfig, RedisConfig, ServerConfig, Settings,
};
