use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use support_chat_api::config::Settings;
use support_chat_api::database::{DbPool, Repository};
use support_chat_api::handlers::build_router;
use support_chat_api::services::cache::{
    CacheStore, HistoryCache, KnowledgeCache, MemoryCacheStore, RedisCacheStore,
};
use support_chat_api::services::chat::{
    ChatOrchestrator, ChatStore, ContentModerator, InputValidator, RateLimiter, ResponseGenerator,
};
use support_chat_api::services::LlmService;
use support_chat_api::state::AppState;
use support_chat_api::utils::logger::init_logger;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;

    info!("🚀 Starting Support Chat API...");

    let settings = Settings::load()?;
    info!("✅ Configuration loaded");

    let db_pool = DbPool::new(&settings.database).await?;
    info!("✅ Database connection established");

    let store: Arc<dyn ChatStore> = Arc::new(Repository::new(db_pool.clone()));

    // Redis when enabled, otherwise the in-process store (swept below)
    let (cache, memory_cache): (Arc<dyn CacheStore>, Option<Arc<MemoryCacheStore>>) =
        if settings.redis.enabled {
            let redis = RedisCacheStore::new(&settings.redis.url)?;
            if let Err(e) = redis.ping().await {
                warn!("Redis not reachable at startup, cache calls will degrade: {:#}", e);
            }
            info!("✅ Redis cache store configured");
            (Arc::new(redis), None)
        } else {
            let memory = Arc::new(MemoryCacheStore::new());
            info!("✅ In-memory cache store configured");
            (memory.clone(), Some(memory))
        };

    let llm_service = Arc::new(LlmService::new(settings.llm.clone())?);
    let chat = &settings.chat;

    let rate_limiter = Arc::new(RateLimiter::from_config(chat));

    let orchestrator = Arc::new(ChatOrchestrator::new(
        store.clone(),
        cache.clone(),
        rate_limiter.clone(),
        ContentModerator::new(llm_service.clone(), chat.moderation_timeout()),
        KnowledgeCache::new(cache.clone(), chat.faq_cache_ttl()),
        HistoryCache::new(cache.clone(), chat.history_cache_ttl()),
        ResponseGenerator::new(
            llm_service,
            settings.prompts.support_system_prompt.clone(),
            settings.llm.temperature,
            settings.llm.max_tokens,
            chat.generation_timeout(),
        ),
        InputValidator::from_config(chat),
        chat.history_limit,
    ));

    spawn_sweeper(
        rate_limiter,
        memory_cache,
        Duration::from_secs(chat.sweep_interval_seconds.max(1)),
    );

    let request_timeout =
        chat.moderation_timeout() + chat.generation_timeout() + Duration::from_secs(10);

    let state = Arc::new(AppState {
        orchestrator,
        store,
        cache,
    });

    let app = build_router(state, request_timeout);

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    info!("👋 Server stopped");

    Ok(())
}

/// Periodically drops idle rate windows and expired in-memory cache entries
fn spawn_sweeper(
    rate_limiter: Arc<RateLimiter>,
    memory_cache: Option<Arc<MemoryCacheStore>>,
    every: Duration,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;

        loop {
            interval.tick().await;
            rate_limiter.evict_idle();
            if let Some(memory) = &memory_cache {
                memory.cleanup_expired();
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
