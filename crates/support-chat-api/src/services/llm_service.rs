use anyhow::{anyhow, Context, Result};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::LlmConfig;
use crate::models::chat::ChatMessage;
use crate::services::chat::{
    CompletionProvider, CompletionRequest, ModerationProvider, ModerationVerdict, Role,
};

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: usize,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ModerationRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    flagged: bool,
    #[serde(default)]
    categories: HashMap<String, bool>,
}

/// OpenAI-compatible HTTP client backing both completion and moderation.
#[derive(Clone)]
pub struct LlmService {
    client: Client,
    config: LlmConfig,
}

impl LlmService {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let builder = self.client.post(url);
        match &self.config.api_key {
            Some(key) if !key.is_empty() => builder.bearer_auth(key),
            _ => builder,
        }
    }

    pub fn build_messages(request: &CompletionRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatMessage::new("system", &request.system_prompt));
        messages.extend(request.history.iter().map(|turn| {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            ChatMessage::new(role, &turn.content)
        }));
        messages.push(ChatMessage::new("user", &request.user_message));
        messages
    }

    /// Non-streaming chat completion
    pub async fn generate_chat(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: Self::build_messages(request),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };
        debug!("Calling chat completion with {} messages", body.messages.len());

        let response = self
            .post("/v1/chat/completions")
            .json(&body)
            .send()
            .await
            .context("Failed to call LLM API")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("LLM API error: {} - {}", status, text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to parse LLM response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("No choices returned from LLM"))
    }

    pub async fn check_moderation(&self, text: &str) -> Result<ModerationVerdict> {
        let response = self
            .post("/v1/moderations")
            .json(&ModerationRequest {
                model: &self.config.moderation_model,
                input: text,
            })
            .send()
            .await
            .context("Failed to call moderation API")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Moderation API error: {} - {}", status, text));
        }

        let parsed: ModerationResponse = response
            .json()
            .await
            .context("Failed to parse moderation response")?;

        let result = parsed
            .results
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Moderation response had no results"))?;

        Ok(ModerationVerdict {
            flagged: result.flagged,
            categories: result.categories,
        })
    }
}

#[async_trait::async_trait]
impl CompletionProvider for LlmService {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.generate_chat(request).await
    }
}

#[async_trait::async_trait]
impl ModerationProvider for LlmService {
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict> {
        self.check_moderation(text).await
    }
}
