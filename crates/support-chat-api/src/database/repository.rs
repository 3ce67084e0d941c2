use super::{DbPool, FaqEntry, Message, MessageRow, Sender};
use crate::services::chat::ChatStore;
use anyhow::Result;
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL-backed store.
///
/// Expects `messages(id uuid, conversation_id uuid, sender text, text text,
/// metadata jsonb, created_at timestamptz)` and `faq_knowledge(category,
/// question, answer, region text null)`. See `docs/schema.sql`.
pub struct Repository {
    pub pool: DbPool,
}

impl Repository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// `%keyword%` with LIKE wildcards in the keyword escaped
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait::async_trait]
impl ChatStore for Repository {
    async fn create_message(
        &self,
        conversation_id: Uuid,
        sender: Sender,
        text: &str,
        metadata: serde_json::Value,
    ) -> Result<Message> {
        let row = sqlx::query_as::<_, MessageRow>(
            r#"INSERT INTO messages (conversation_id, sender, text, metadata)
               VALUES ($1, $2, $3, $4)
               RETURNING id, conversation_id, sender, text, metadata, created_at"#,
        )
        .bind(conversation_id)
        .bind(sender.as_str())
        .bind(text)
        .bind(metadata)
        .fetch_one(self.pool.get_pool())
        .await?;

        debug!("Stored {} message {} in conversation {}", sender, row.id, conversation_id);

        Message::try_from(row)
    }

    async fn list_recent_messages(
        &self,
        conversation_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"SELECT id, conversation_id, sender, text, metadata, created_at
               FROM messages
               WHERE conversation_id = $1
               ORDER BY created_at DESC
               LIMIT $2"#,
        )
        .bind(conversation_id)
        .bind(limit as i64)
        .fetch_all(self.pool.get_pool())
        .await?;

        rows.into_iter().map(Message::try_from).collect()
    }

    async fn search_faqs(&self, keyword: &str, region: Option<&str>) -> Result<Vec<FaqEntry>> {
        let faqs = sqlx::query_as::<_, FaqEntry>(
            r#"SELECT category, question, answer, region
               FROM faq_knowledge
               WHERE (question ILIKE $1 OR answer ILIKE $1)
                 AND ($2::text IS NULL OR region = $2 OR region IS NULL)
               ORDER BY category, region NULLS LAST"#,
        )
        .bind(like_pattern(keyword))
        .bind(region)
        .persistent(false)
        .fetch_all(self.pool.get_pool())
        .await?;

        debug!("FAQ search for '{}' matched {} entries", keyword, faqs.len());

        Ok(faqs)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(self.pool.get_pool()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("shipping"), "%shipping%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }
}
