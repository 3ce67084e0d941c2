use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::utils::error::ChatError;

static UUID_V4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("valid uuid regex")
});

static INJECTION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)<script", r"(?i)javascript:", r"(?i)on\w+\s*=", r"(?i)eval\("]
        .iter()
        .map(|p| Regex::new(p).expect("valid injection regex"))
        .collect()
});

static HARMFUL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(kill|murder|harm|attack)\s+(yourself|others)",
        r"(?i)\b(illegal|unlawful)\s+(activity|activities|action)",
        r"(?i)\bpersonal\s+information\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid harmful-content regex"))
    .collect()
});

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Inbound request checks. Every failure names the offending field.
#[derive(Debug, Clone)]
pub struct InputValidator {
    max_message_chars: usize,
    allowed_regions: Vec<String>,
}

impl InputValidator {
    pub fn new(max_message_chars: usize, allowed_regions: Vec<String>) -> Self {
        Self {
            max_message_chars,
            allowed_regions,
        }
    }

    pub fn from_config(cfg: &ChatConfig) -> Self {
        Self::new(cfg.max_message_chars, cfg.allowed_regions.clone())
    }

    pub fn validate_conversation_id(&self, id: &str) -> Result<Uuid, ChatError> {
        if id.is_empty() {
            return Err(ChatError::validation("conversationId", "Conversation ID is required"));
        }
        if !UUID_V4.is_match(id) {
            return Err(ChatError::validation("conversationId", "Invalid conversation ID format"));
        }
        Uuid::parse_str(id)
            .map_err(|_| ChatError::validation("conversationId", "Invalid conversation ID format"))
    }

    pub fn validate_message(&self, message: &str) -> Result<(), ChatError> {
        let trimmed = message.trim();

        if trimmed.is_empty() {
            return Err(ChatError::validation("message", "Message cannot be empty"));
        }

        if trimmed.chars().count() > self.max_message_chars {
            return Err(ChatError::validation(
                "message",
                format!("Message is too long (max {} characters)", self.max_message_chars),
            ));
        }

        // control characters are stripped later, so match the sanitized form too
        let sanitized = sanitize_input(trimmed);
        if INJECTION_PATTERNS
            .iter()
            .any(|p| p.is_match(trimmed) || p.is_match(&sanitized))
        {
            return Err(ChatError::validation(
                "message",
                "Message contains potentially harmful content",
            ));
        }

        Ok(())
    }

    /// Absent region is valid
    pub fn validate_region(&self, region: Option<&str>) -> Result<(), ChatError> {
        match region {
            None => Ok(()),
            Some(r) if self.allowed_regions.iter().any(|a| a == r) => Ok(()),
            Some(_) => Err(ChatError::validation(
                "region",
                format!(
                    "Invalid region. Must be one of: {}",
                    self.allowed_regions.join(", ")
                ),
            )),
        }
    }
}

/// Collapse whitespace runs to one space, strip C0/C1 control characters, trim.
pub fn sanitize_input(input: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(input, " ");
    collapsed
        .chars()
        .filter(|c| !matches!(*c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Rejects empty output and short refusals.
pub fn validate_ai_response(response: &str) -> Result<(), &'static str> {
    let trimmed = response.trim();

    if trimmed.is_empty() {
        return Err("AI response is empty");
    }

    if trimmed.chars().count() < 50 && trimmed.to_lowercase().contains("i cannot") {
        return Err("AI refused to respond");
    }

    Ok(())
}

pub fn contains_harmful_content(response: &str) -> bool {
    HARMFUL_PATTERNS.iter().any(|p| p.is_match(response))
}
