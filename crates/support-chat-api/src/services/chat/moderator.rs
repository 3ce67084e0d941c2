use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use super::providers::ModerationProvider;
use super::types::ModerationVerdict;

/// Wraps the moderation capability. Fails open: an upstream error or timeout
/// yields an unflagged verdict and an error log.
#[derive(Clone)]
pub struct ContentModerator {
    provider: Arc<dyn ModerationProvider>,
    timeout: Duration,
}

impl ContentModerator {
    pub fn new(provider: Arc<dyn ModerationProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn moderate(&self, text: &str) -> ModerationVerdict {
        match tokio::time::timeout(self.timeout, self.provider.moderate(text)).await {
            Ok(Ok(verdict)) => {
                debug!("Moderation verdict: flagged={}", verdict.flagged);
                verdict
            }
            Ok(Err(e)) => {
                error!("Moderation unavailable, failing open: {:#}", e);
                ModerationVerdict::safe()
            }
            Err(_) => {
                error!("Moderation timed out after {:?}, failing open", self.timeout);
                ModerationVerdict::safe()
            }
        }
    }
}
