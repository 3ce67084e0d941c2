pub mod generator;
pub mod moderator;
pub mod orchestrator;
pub mod providers;
pub mod rate_limiter;
pub mod types;
pub mod validation;

pub use generator::ResponseGenerator;
pub use moderator::ContentModerator;
pub use orchestrator::{
    ChatOrchestrator, GENERATION_FALLBACK_MESSAGE, GUIDELINE_VIOLATION_MESSAGE,
    HARMFUL_CONTENT_REPLY,
};
pub use providers::{ChatStore, CompletionProvider, ModerationProvider};
pub use rate_limiter::RateLimiter;
pub use types::{
    ChatOptions, ChatOutcome, ChatTurn, CompletionRequest, ModerationReport, ModerationVerdict,
    RateDecision, Role,
};
pub use validation::InputValidator;
