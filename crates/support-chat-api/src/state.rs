use std::sync::Arc;

use crate::services::cache::CacheStore;
use crate::services::chat::{ChatOrchestrator, ChatStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub store: Arc<dyn ChatStore>,
    pub cache: Arc<dyn CacheStore>,
}
