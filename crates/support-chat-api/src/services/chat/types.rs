use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl From<Sender> for Role {
    fn from(sender: Sender) -> Self {
        match sender {
            Sender::User => Role::User,
            Sender::Ai => Role::Assistant,
        }
    }
}

/// One turn of conversation history as fed to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Raw verdict from the moderation capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub flagged: bool,
    #[serde(default)]
    pub categories: HashMap<String, bool>,
}

impl ModerationVerdict {
    /// Fail-open default used when moderation is unavailable
    pub fn safe() -> Self {
        Self::default()
    }
}

/// Standalone moderation result exposed to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationReport {
    pub safe: bool,
    pub flagged: bool,
    pub categories: HashMap<String, bool>,
}

impl From<ModerationVerdict> for ModerationReport {
    fn from(v: ModerationVerdict) -> Self {
        Self {
            safe: !v.flagged,
            flagged: v.flagged,
            categories: v.categories,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub reset_in_seconds: Option<u64>,
}

impl RateDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reset_in_seconds: None,
        }
    }

    pub fn deny(reset_in_seconds: u64) -> Self {
        Self {
            allowed: false,
            reset_in_seconds: Some(reset_in_seconds),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub region: Option<String>,
    pub include_history: bool,
    pub user_id: Option<String>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            region: None,
            include_history: true,
            user_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub user_message_id: Uuid,
    pub ai_message_id: Uuid,
    pub response: String,
    pub sources: Vec<String>,
}

/// Everything the completion capability needs for one call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub history: Vec<ChatTurn>,
    pub user_message: String,
    pub temperature: f32,
    pub max_tokens: usize,
}
