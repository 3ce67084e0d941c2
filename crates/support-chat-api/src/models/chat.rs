use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::chat::{ChatOptions, ChatOutcome, ModerationReport};

/// OpenAI-style chat message on the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

// ===== REQUEST MODELS =====

fn default_include_history() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub conversation_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_include_history")]
    pub include_history: bool,
}

impl ChatRequest {
    pub fn options(&self) -> ChatOptions {
        ChatOptions {
            region: self.region.clone(),
            include_history: self.include_history,
            user_id: self.user_id.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ModerateRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    #[serde(default)]
    pub region: Option<String>,
}

// ===== RESPONSE MODELS =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponseData {
    pub user_message_id: Uuid,
    pub ai_message_id: Uuid,
    pub response: String,
    pub sources: Vec<String>,
}

impl From<ChatOutcome> for ChatResponseData {
    fn from(o: ChatOutcome) -> Self {
        Self {
            user_message_id: o.user_message_id,
            ai_message_id: o.ai_message_id,
            response: o.response,
            sources: o.sources,
        }
    }
}

/// `{ success: true, data, timestamp }` envelope for successful calls
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModerationResponseData {
    pub safe: bool,
    pub flagged: bool,
    pub categories: std::collections::HashMap<String, bool>,
}

impl From<ModerationReport> for ModerationResponseData {
    fn from(r: ModerationReport) -> Self {
        Self {
            safe: r.safe,
            flagged: r.flagged,
            categories: r.categories,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuggestionsData {
    pub suggestions: Vec<String>,
}
