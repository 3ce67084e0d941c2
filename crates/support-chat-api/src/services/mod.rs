pub mod cache;
pub mod chat;
pub mod llm_service;

pub use llm_service::LlmService;
