//! Collaborator contracts consumed by the chat engine.
//!
//! Every call here crosses an I/O boundary; callers never hold engine locks
//! while awaiting them.

use anyhow::Result;
use uuid::Uuid;

use super::types::{CompletionRequest, ModerationVerdict};
use crate::database::{FaqEntry, Message, Sender};

/// Durable message + knowledge-base storage
#[async_trait::async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_message(
        &self,
        conversation_id: Uuid,
        sender: Sender,
        text: &str,
        metadata: serde_json::Value,
    ) -> Result<Message>;

    /// Newest first
    async fn list_recent_messages(&self, conversation_id: Uuid, limit: usize)
        -> Result<Vec<Message>>;

    /// Case-insensitive substring match over question and answer, ordered by
    /// category then region (global entries last). A region filter keeps
    /// global entries.
    async fn search_faqs(&self, keyword: &str, region: Option<&str>) -> Result<Vec<FaqEntry>>;

    async fn ping(&self) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ModerationProvider: Send + Sync {
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
