pub mod cache;
pub mod chat;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::state::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn build_router(state: Arc<AppState>, request_timeout: Duration) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let api_routes = Router::new()
        .route("/api/chat/message", post(chat::send_message_handler))
        .route("/api/chat/moderate", post(chat::moderate_handler))
        .route("/api/chat/suggestions", get(chat::suggestions_handler))
        .route("/api/cache/stats", get(cache::cache_stats_handler))
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{FaqEntry, Message, Sender};
    use crate::services::cache::{CacheStore, HistoryCache, KnowledgeCache, MemoryCacheStore};
    use crate::services::chat::providers::{MockCompletionProvider, MockModerationProvider};
    use crate::services::chat::{
        ChatOrchestrator, ChatStore, ContentModerator, InputValidator, ModerationVerdict,
        RateLimiter, ResponseGenerator,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tower::ServiceExt;
    use uuid::Uuid;

    #[derive(Default)]
    struct MemoryStore {
        messages: Mutex<Vec<Message>>,
        down: bool,
    }

    #[async_trait::async_trait]
    impl ChatStore for MemoryStore {
        async fn create_message(
            &self,
            conversation_id: Uuid,
            sender: Sender,
            text: &str,
            metadata: serde_json::Value,
        ) -> anyhow::Result<Message> {
            let msg = Message {
                id: Uuid::new_v4(),
                conversation_id,
                sender,
                text: text.to_string(),
                metadata,
                created_at: Utc::now(),
            };
            self.messages.lock().unwrap().push(msg.clone());
            Ok(msg)
        }

        async fn list_recent_messages(
            &self,
            _conversation_id: Uuid,
            _limit: usize,
        ) -> anyhow::Result<Vec<Message>> {
            Ok(Vec::new())
        }

        async fn search_faqs(
            &self,
            _keyword: &str,
            _region: Option<&str>,
        ) -> anyhow::Result<Vec<FaqEntry>> {
            Ok(vec![FaqEntry {
                category: "Returns".to_string(),
                question: "How do I return a product?".to_string(),
                answer: "Returns are accepted within 30 days.".to_string(),
                region: None,
            }])
        }

        async fn ping(&self) -> anyhow::Result<()> {
            if self.down {
                anyhow::bail!("database unreachable");
            }
            Ok(())
        }
    }

    fn app_with(store: MemoryStore, max_requests: u32) -> Router {
        let store: Arc<dyn ChatStore> = Arc::new(store);
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());

        let mut moderation = MockModerationProvider::new();
        moderation
            .expect_moderate()
            .returning(|_| Ok(ModerationVerdict::safe()));
        let mut completion = MockCompletionProvider::new();
        completion
            .expect_complete()
            .returning(|_| Ok("You can return any product within 30 days of delivery.".to_string()));

        let orchestrator = ChatOrchestrator::new(
            store.clone(),
            cache.clone(),
            Arc::new(RateLimiter::new(
                max_requests,
                Duration::from_secs(60),
                Duration::from_secs(60),
            )),
            ContentModerator::new(Arc::new(moderation), Duration::from_secs(1)),
            KnowledgeCache::new(cache.clone(), Duration::from_secs(3600)),
            HistoryCache::new(cache.clone(), Duration::from_secs(900)),
            ResponseGenerator::new(
                Arc::new(completion),
                ResponseGenerator::default_system_prompt(),
                0.7,
                500,
                Duration::from_secs(1),
            ),
            InputValidator::new(2000, vec!["USA".into(), "Japan".into()]),
            10,
        );

        let state = Arc::new(AppState {
            orchestrator: Arc::new(orchestrator),
            store,
            cache,
        });
        build_router(state, Duration::from_secs(5))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_chat_message_success() {
        let app = app_with(MemoryStore::default(), 10);
        let (status, body) = send(
            &app,
            post_json(
                "/api/chat/message",
                json!({
                    "conversationId": Uuid::new_v4().to_string(),
                    "message": "How do I return a product?"
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["sources"][0], "Returns");
        assert!(body["data"]["userMessageId"].is_string());
        assert!(body["data"]["aiMessageId"].is_string());
    }

    #[tokio::test]
    async fn test_chat_validation_error_names_field() {
        let app = app_with(MemoryStore::default(), 10);
        let (status, body) = send(
            &app,
            post_json(
                "/api/chat/message",
                json!({"conversationId": "123", "message": "hello"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "ValidationError");
        assert_eq!(body["field"], "conversationId");
    }

    #[tokio::test]
    async fn test_chat_rate_limited() {
        let app = app_with(MemoryStore::default(), 1);
        let id = Uuid::new_v4().to_string();
        let body = json!({"conversationId": id, "message": "hello there"});

        let (status, _) = send(&app, post_json("/api/chat/message", body.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, post_json("/api/chat/message", body)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "RateLimitExceeded");
        assert!(body["reset_in"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_moderate_endpoint() {
        let app = app_with(MemoryStore::default(), 10);

        let (status, body) =
            send(&app, post_json("/api/chat/moderate", json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["safe"], true);

        let (status, body) =
            send(&app, post_json("/api/chat/moderate", json!({"message": " "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "message");
    }

    #[tokio::test]
    async fn test_suggestions_and_stats() {
        let app = app_with(MemoryStore::default(), 10);

        let (status, body) = send(
            &app,
            Request::get("/api/chat/suggestions?region=Japan")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["suggestions"].as_array().unwrap().len(), 3);

        let (status, body) = send(
            &app,
            Request::get("/api/cache/stats").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["faq_keys"], 0);
    }

    #[tokio::test]
    async fn test_readiness_reports_store_outage() {
        let app = app_with(MemoryStore::default(), 10);
        let (status, body) = send(
            &app,
            Request::get("/health/ready").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");

        let app = app_with(
            MemoryStore {
                down: true,
                ..Default::default()
            },
            10,
        );
        let (status, body) = send(
            &app,
            Request::get("/health/ready").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["database"], false);
        assert_eq!(body["cache"], true);
    }
}
