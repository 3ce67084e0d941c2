use anyhow::Result;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::generator::ResponseGenerator;
use super::moderator::ContentModerator;
use super::providers::ChatStore;
use super::rate_limiter::RateLimiter;
use super::types::{ChatOptions, ChatOutcome, ChatTurn, ModerationReport, Role};
use super::validation::{
    contains_harmful_content, sanitize_input, validate_ai_response, InputValidator,
};
use crate::database::Sender;
use crate::services::cache::{
    extract_sources, format_faq_context, turns_from_recent, CacheStats, CacheStore,
    HistoryCache, KnowledgeCache,
};
use crate::utils::error::ChatError;

/// Reply used when generation fails after the user turn is stored
pub const GENERATION_FALLBACK_MESSAGE: &str = "I apologize, but I'm experiencing technical difficulties. Please try again in a moment or contact our support team.";

/// Replaces a generated reply that trips the harmful-content check
pub const HARMFUL_CONTENT_REPLY: &str = "I apologize, but I'm unable to provide a response to that query. Please contact our human support team for assistance.";

pub const GUIDELINE_VIOLATION_MESSAGE: &str =
    "Your message contains content that violates our guidelines. Please rephrase and try again.";

const SUGGESTED_QUESTIONS: [&str; 5] = [
    "What are your shipping options?",
    "How do I return a product?",
    "What payment methods do you accept?",
    "Do you have gaming mice in stock?",
    "What is your warranty policy?",
];

/// Caller context stored alongside the user turn; absent fields are omitted
fn user_metadata(options: &ChatOptions) -> Value {
    let mut meta = Map::new();
    if let Some(region) = &options.region {
        meta.insert("region".to_string(), json!(region));
    }
    if let Some(user_id) = &options.user_id {
        meta.insert("userId".to_string(), json!(user_id));
    }
    Value::Object(meta)
}

/// Drives one inbound message through
/// validate → rate check → moderate → persist user → build context →
/// generate → validate reply → persist AI → invalidate history.
///
/// Validation, rate-limit and moderation rejections return before any write.
/// Once the user turn is stored, generation problems degrade to a fallback
/// reply instead of an error.
pub struct ChatOrchestrator {
    store: Arc<dyn ChatStore>,
    cache_store: Arc<dyn CacheStore>,
    rate_limiter: Arc<RateLimiter>,
    moderator: ContentModerator,
    knowledge: KnowledgeCache,
    history: HistoryCache,
    generator: ResponseGenerator,
    validator: InputValidator,
    history_limit: usize,
}

impl ChatOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn ChatStore>,
        cache_store: Arc<dyn CacheStore>,
        rate_limiter: Arc<RateLimiter>,
        moderator: ContentModerator,
        knowledge: KnowledgeCache,
        history: HistoryCache,
        generator: ResponseGenerator,
        validator: InputValidator,
        history_limit: usize,
    ) -> Self {
        Self {
            store,
            cache_store,
            rate_limiter,
            moderator,
            knowledge,
            history,
            generator,
            validator,
            history_limit,
        }
    }

    pub async fn process_chat(
        &self,
        conversation_id: &str,
        message: &str,
        options: ChatOptions,
    ) -> Result<ChatOutcome, ChatError> {
        let start_time = Instant::now();

        let conversation_id = self.validator.validate_conversation_id(conversation_id)?;
        self.validator.validate_message(message)?;
        self.validator.validate_region(options.region.as_deref())?;
        let text = sanitize_input(message);

        let decision = self.rate_limiter.check_limit(&conversation_id.to_string());
        if !decision.allowed {
            let reset_in_seconds = decision.reset_in_seconds.unwrap_or(1);
            warn!(
                "Rate limit exceeded for conversation {}, reset in {}s",
                conversation_id, reset_in_seconds
            );
            return Err(ChatError::RateLimited { reset_in_seconds });
        }

        let verdict = self.moderator.moderate(&text).await;
        if verdict.flagged {
            let flagged: Vec<&str> = verdict
                .categories
                .iter()
                .filter(|(_, v)| **v)
                .map(|(k, _)| k.as_str())
                .collect();
            warn!(
                "Message rejected by moderation in conversation {}: {:?}",
                conversation_id, flagged
            );
            return Err(ChatError::validation("message", GUIDELINE_VIOLATION_MESSAGE));
        }

        let user_msg = self
            .store
            .create_message(conversation_id, Sender::User, &text, user_metadata(&options))
            .await
            .map_err(|e| ChatError::Store(format!("{:#}", e)))?;

        let (response, sources) = self.generate_reply(conversation_id, &text, &options).await;

        let ai_msg = self
            .store
            .create_message(
                conversation_id,
                Sender::Ai,
                &response,
                json!({ "sources": &sources }),
            )
            .await
            .map_err(|e| ChatError::Store(format!("{:#}", e)))?;

        self.history.invalidate(conversation_id).await;

        info!(
            "Chat processed for conversation {} in {}ms ({} sources)",
            conversation_id,
            start_time.elapsed().as_millis(),
            sources.len()
        );

        Ok(ChatOutcome {
            user_message_id: user_msg.id,
            ai_message_id: ai_msg.id,
            response,
            sources,
        })
    }

    /// Never fails: any problem yields the fallback reply with no sources.
    async fn generate_reply(
        &self,
        conversation_id: Uuid,
        text: &str,
        options: &ChatOptions,
    ) -> (String, Vec<String>) {
        let (response, sources) = match self.try_generate(conversation_id, text, options).await {
            Ok(out) => out,
            Err(e) => {
                error!(
                    "Generation failed for conversation {}, using fallback: {:#}",
                    conversation_id, e
                );
                return (GENERATION_FALLBACK_MESSAGE.to_string(), Vec::new());
            }
        };

        if let Err(reason) = validate_ai_response(&response) {
            error!(
                "Rejected AI response for conversation {} ({}), using fallback",
                conversation_id, reason
            );
            return (GENERATION_FALLBACK_MESSAGE.to_string(), Vec::new());
        }

        if contains_harmful_content(&response) {
            warn!(
                "Harmful content detected in AI response for conversation {}",
                conversation_id
            );
            return (HARMFUL_CONTENT_REPLY.to_string(), Vec::new());
        }

        (response, sources)
    }

    async fn try_generate(
        &self,
        conversation_id: Uuid,
        text: &str,
        options: &ChatOptions,
    ) -> Result<(String, Vec<String>)> {
        let faq_context = self
            .find_relevant_faqs(text, options.region.as_deref())
            .await?;

        let history = if options.include_history {
            let mut turns = self.conversation_history(conversation_id).await?;
            // the just-stored user turn is sent separately as the current message
            if turns
                .last()
                .is_some_and(|t| t.role == Role::User && t.content == text)
            {
                turns.pop();
            }
            turns
        } else {
            Vec::new()
        };

        let response = self.generator.generate(text, &faq_context, &history).await?;
        Ok((response, extract_sources(&faq_context)))
    }

    /// FAQ context string for `query`, served from cache when possible
    pub async fn find_relevant_faqs(&self, query: &str, region: Option<&str>) -> Result<String> {
        if let Some(cached) = self.knowledge.get(query, region).await {
            return Ok(format_faq_context(&cached));
        }

        debug!("Searching FAQs for query: {}", query);
        let results = self.store.search_faqs(query, region).await?;
        self.knowledge.put(query, region, &results).await;

        Ok(format_faq_context(&results))
    }

    /// Recent turns in chronological order, served from cache when possible
    pub async fn conversation_history(&self, conversation_id: Uuid) -> Result<Vec<ChatTurn>> {
        if let Some(mut cached) = self.history.get(conversation_id).await {
            let skip = cached.len().saturating_sub(self.history_limit);
            cached.drain(..skip);
            return Ok(cached);
        }

        let recent = self
            .store
            .list_recent_messages(conversation_id, self.history_limit)
            .await?;
        let turns = turns_from_recent(recent);
        self.history.put(conversation_id, &turns).await;

        Ok(turns)
    }

    /// Standalone moderation check; fails open like the chat path.
    pub async fn moderate_message(&self, text: &str) -> ModerationReport {
        self.moderator.moderate(text).await.into()
    }

    /// Starter questions for a new conversation
    pub fn suggested_questions(&self, region: Option<&str>) -> Vec<String> {
        debug!("Suggested questions requested (region: {:?})", region);
        SUGGESTED_QUESTIONS
            .iter()
            .take(3)
            .map(|q| q.to_string())
            .collect()
    }

    pub async fn invalidate_faq_cache(&self) -> usize {
        self.knowledge.invalidate_all().await
    }

    pub async fn cache_stats(&self) -> Result<CacheStats> {
        CacheStats::collect(self.cache_store.as_ref()).await
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }
}
