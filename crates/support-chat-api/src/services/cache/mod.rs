//! Cache layer
//!
//! - `CacheStore`: shared key-value store (Redis or in-process DashMap)
//! - `KnowledgeCache`: FAQ search results, 1h TTL
//! - `HistoryCache`: recent-message window per conversation, 15m TTL

mod history;
mod knowledge;
mod redis_store;
mod store;

pub use history::{turns_from_recent, HistoryCache, CONVERSATION_PREFIX, HISTORY_PREFIX};
pub use knowledge::{
    extract_sources, format_faq_context, KnowledgeCache, FAQ_PREFIX, FAQ_SEARCH_PREFIX,
    NO_FAQ_CONTEXT,
};
pub use redis_store::RedisCacheStore;
pub use store::{CacheStore, MemoryCacheStore};

use serde::Serialize;

/// Key counts per cache family
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub faq_keys: usize,
    pub conversation_keys: usize,
    pub message_keys: usize,
}

impl CacheStats {
    pub async fn collect(store: &dyn CacheStore) -> anyhow::Result<Self> {
        Ok(Self {
            faq_keys: store.count_prefix(FAQ_PREFIX).await?,
            conversation_keys: store.count_prefix(CONVERSATION_PREFIX).await?,
            message_keys: store.count_prefix(HISTORY_PREFIX).await?,
        })
    }
}
