use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::providers::CompletionProvider;
use super::types::{ChatTurn, CompletionRequest};

/// Placeholder in the system prompt template replaced by the FAQ context
pub const FAQ_CONTEXT_PLACEHOLDER: &str = "{{FAQ_CONTEXT}}";

/// Canned reply the prompt instructs the model to use for off-topic requests
pub const OUT_OF_SCOPE_REPLY: &str = "I'm here to help with questions about GamerHub store - our gaming products, shipping, returns, and orders. How can I assist you with your shopping today?";

const MAX_HISTORY_TURNS: usize = 10;

/// Builds the support prompt and calls the completion capability.
pub struct ResponseGenerator {
    provider: Arc<dyn CompletionProvider>,
    system_prompt_template: String,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
}

impl ResponseGenerator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        system_prompt_template: String,
        temperature: f32,
        max_tokens: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            system_prompt_template,
            temperature,
            max_tokens,
            timeout,
        }
    }

    pub fn default_system_prompt() -> String {
        format!(
            r#"You are a helpful and friendly customer support AI for GamerHub, an online gaming accessories store.

Your ONLY role is to help with GamerHub store-related questions:
- Products (gaming mice, keyboards, headsets, controllers, etc.)
- Shipping (to USA, India, Japan, China only)
- Returns and refunds
- Payment methods
- Order tracking
- Product recommendations
- Store policies

STAY ON TOPIC:
If a customer asks about ANYTHING not related to GamerHub store (programming, general knowledge, other topics), reply exactly:
"{OUT_OF_SCOPE_REPLY}"

RULES:
1. ONLY answer questions related to GamerHub store and e-commerce
2. Be specific and direct with store-related answers
3. We ONLY ship to USA, India, Japan, and China
4. Use the FAQ context when available, make reasonable e-commerce inferences otherwise
5. Only suggest human support for complex account-specific issues

FAQ Context:
{FAQ_CONTEXT_PLACEHOLDER}"#
        )
    }

    pub fn build_system_prompt(&self, faq_context: &str) -> String {
        self.system_prompt_template
            .replace(FAQ_CONTEXT_PLACEHOLDER, faq_context)
    }

    pub fn build_request(
        &self,
        user_message: &str,
        faq_context: &str,
        history: &[ChatTurn],
    ) -> CompletionRequest {
        let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);

        CompletionRequest {
            system_prompt: self.build_system_prompt(faq_context),
            history: history[skip..].to_vec(),
            user_message: user_message.to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Timeout counts as a generation failure.
    pub async fn generate(
        &self,
        user_message: &str,
        faq_context: &str,
        history: &[ChatTurn],
    ) -> Result<String> {
        let request = self.build_request(user_message, faq_context, history);
        debug!(
            "Generating response with {} history turns, context {} chars",
            request.history.len(),
            faq_context.len()
        );

        tokio::time::timeout(self.timeout, self.provider.complete(&request))
            .await
            .map_err(|_| anyhow!("Completion timed out after {:?}", self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::chat::providers::MockCompletionProvider;

    fn generator(provider: MockCompletionProvider) -> ResponseGenerator {
        ResponseGenerator::new(
            Arc::new(provider),
            ResponseGenerator::default_system_prompt(),
            0.7,
            500,
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_system_prompt_injects_context_and_scope() {
        let g = generator(MockCompletionProvider::new());
        let prompt = g.build_system_prompt("1. Category: Shipping [Global]\nQ: a\nA: b");

        assert!(prompt.contains("1. Category: Shipping [Global]"));
        assert!(prompt.contains(OUT_OF_SCOPE_REPLY));
        assert!(!prompt.contains(FAQ_CONTEXT_PLACEHOLDER));
    }

    #[test]
    fn test_request_keeps_last_ten_turns() {
        let g = generator(MockCompletionProvider::new());
        let history: Vec<ChatTurn> = (0..14).map(|i| ChatTurn::user(format!("m{}", i))).collect();

        let req = g.build_request("now", "ctx", &history);
        assert_eq!(req.history.len(), 10);
        assert_eq!(req.history[0].content, "m4");
        assert_eq!(req.user_message, "now");
        assert_eq!(req.max_tokens, 500);
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_generate_calls_provider() {
        let mut provider = MockCompletionProvider::new();
        provider
            .expect_complete()
            .withf(|req| req.user_message == "Do you ship to Japan?" && req.history.len() == 1)
            .times(1)
            .returning(|_| Ok("Yes, we ship to Japan.".to_string()));

        let g = generator(provider);
        let out = g
            .generate("Do you ship to Japan?", "ctx", &[ChatTurn::user("hi")])
            .await
            .unwrap();
        assert_eq!(out, "Yes, we ship to Japan.");
    }
}
