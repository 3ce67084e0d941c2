use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::store::CacheStore;
use crate::database::FaqEntry;

pub const FAQ_PREFIX: &str = "faq:";
pub const FAQ_SEARCH_PREFIX: &str = "faq:search:";

/// Context text used when a search matched nothing
pub const NO_FAQ_CONTEXT: &str = "No relevant FAQ information found.";

/// Matches only the numbered header line of each context block
static CATEGORY_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\d+\. Category: ([^\[\n]+)").expect("valid category regex")
});

/// FAQ search results keyed by normalized query + region.
///
/// Store faults degrade to a miss (reads) or a skipped write; they never fail
/// the chat request.
#[derive(Clone)]
pub struct KnowledgeCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl KnowledgeCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Lowercased, trimmed, internal whitespace collapsed
    pub fn normalize_query(query: &str) -> String {
        query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    pub fn key(query: &str, region: Option<&str>) -> String {
        format!(
            "{}{}:{}",
            FAQ_SEARCH_PREFIX,
            Self::normalize_query(query),
            region.unwrap_or("global")
        )
    }

    pub async fn get(&self, query: &str, region: Option<&str>) -> Option<Vec<FaqEntry>> {
        let key = Self::key(query, region);

        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("FAQ cache miss: {}", key);
                return None;
            }
            Err(e) => {
                warn!("FAQ cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice::<Vec<FaqEntry>>(&raw) {
            Ok(entries) => {
                debug!("FAQ cache hit: {} ({} entries)", key, entries.len());
                Some(entries)
            }
            Err(e) => {
                warn!("Discarding undecodable FAQ cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Empty result lists are cached too.
    pub async fn put(&self, query: &str, region: Option<&str>, entries: &[FaqEntry]) {
        let key = Self::key(query, region);

        let payload = match serde_json::to_vec(entries) {
            Ok(p) => Bytes::from(p),
            Err(e) => {
                warn!("Failed to encode FAQ results for {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.store.set_with_ttl(&key, payload, self.ttl).await {
            warn!("FAQ cache write failed for {}: {}", key, e);
        }
    }

    /// Drop every FAQ-derived entry (after out-of-band FAQ edits)
    pub async fn invalidate_all(&self) -> usize {
        match self.store.delete_prefix(FAQ_PREFIX).await {
            Ok(count) => {
                info!("Invalidated {} FAQ cache entries", count);
                count
            }
            Err(e) => {
                warn!("FAQ cache invalidation failed: {}", e);
                0
            }
        }
    }
}

/// One numbered block per entry, blank line between blocks.
pub fn format_faq_context(entries: &[FaqEntry]) -> String {
    if entries.is_empty() {
        return NO_FAQ_CONTEXT.to_string();
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, faq)| {
            let region = match &faq.region {
                Some(r) => format!(" [{}]", r),
                None => " [Global]".to_string(),
            };
            format!(
                "{}. Category: {}{}\nQ: {}\nA: {}",
                i + 1,
                faq.category,
                region,
                faq.question,
                faq.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Distinct category labels in first-seen order
pub fn extract_sources(context: &str) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for cap in CATEGORY_MARKER.captures_iter(context) {
        let label = cap[1].trim();
        if !label.is_empty() && !sources.iter().any(|s| s == label) {
            sources.push(label.to_string());
        }
    }
    sources
}
