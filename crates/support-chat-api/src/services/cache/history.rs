use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::store::CacheStore;
use crate::database::Message;
use crate::services::chat::ChatTurn;

pub const HISTORY_PREFIX: &str = "messages:";
pub const CONVERSATION_PREFIX: &str = "conversation:";

/// Recent-message window per conversation. Write-then-invalidate: new
/// messages discard the cached window instead of patching it.
#[derive(Clone)]
pub struct HistoryCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl HistoryCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    fn key(conversation_id: Uuid) -> String {
        format!("{}{}", HISTORY_PREFIX, conversation_id)
    }

    pub async fn get(&self, conversation_id: Uuid) -> Option<Vec<ChatTurn>> {
        let key = Self::key(conversation_id);

        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("History cache miss for conversation {}", conversation_id);
                return None;
            }
            Err(e) => {
                warn!("History cache read failed for {}: {}", conversation_id, e);
                return None;
            }
        };

        match serde_json::from_slice::<Vec<ChatTurn>>(&raw) {
            Ok(turns) => {
                debug!("History cache hit for {} ({} turns)", conversation_id, turns.len());
                Some(turns)
            }
            Err(e) => {
                warn!("Discarding undecodable history for {}: {}", conversation_id, e);
                None
            }
        }
    }

    pub async fn put(&self, conversation_id: Uuid, turns: &[ChatTurn]) {
        let key = Self::key(conversation_id);

        let payload = match serde_json::to_vec(turns) {
            Ok(p) => Bytes::from(p),
            Err(e) => {
                warn!("Failed to encode history for {}: {}", conversation_id, e);
                return;
            }
        };

        if let Err(e) = self.store.set_with_ttl(&key, payload, self.ttl).await {
            warn!("History cache write failed for {}: {}", conversation_id, e);
        }
    }

    /// Drops both the message window and any cached conversation record.
    pub async fn invalidate(&self, conversation_id: Uuid) {
        for key in [
            Self::key(conversation_id),
            format!("{}{}", CONVERSATION_PREFIX, conversation_id),
        ] {
            if let Err(e) = self.store.delete(&key).await {
                warn!("Cache invalidation failed for {}: {}", key, e);
            }
        }
        debug!("Invalidated history cache for {}", conversation_id);
    }
}

/// Newest-first store rows to chronological turns
pub fn turns_from_recent(mut messages: Vec<Message>) -> Vec<ChatTurn> {
    messages.reverse();
    messages
        .into_iter()
        .map(|m| ChatTurn {
            role: m.sender.into(),
            content: m.text,
        })
        .collect()
}
