use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Who wrote a message. Stored as `user` / `ai`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Ai => "ai",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "ai" | "assistant" => Ok(Sender::Ai),
            other => Err(anyhow!("Unknown message sender: {}", other)),
        }
    }
}

/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: Sender,
    pub text: String,
    /// `region`/`userId` on user turns, `sources` on AI turns
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: String,
    pub text: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = anyhow::Error;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Message {
            id: row.id,
            conversation_id: row.conversation_id,
            sender: row.sender.parse()?,
            text: row.text,
            metadata: row.metadata,
            created_at: row.created_at,
        })
    }
}

/// Knowledge-base entry. `region == None` applies globally.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct FaqEntry {
    pub category: String,
    pub question: String,
    pub answer: String,
    pub region: Option<String>,
}
