use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
    database: bool,
    cache: bool,
}

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// 503 unless both the message store and the cache store answer a ping
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let (db, cache) = tokio::join!(state.store.ping(), state.cache.ping());

    if let Err(e) = &db {
        warn!("Readiness: database ping failed: {:#}", e);
    }
    if let Err(e) = &cache {
        warn!("Readiness: cache ping failed: {:#}", e);
    }

    let ready = db.is_ok() && cache.is_ok();
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ReadinessResponse {
            status: if ready { "ready" } else { "unavailable" },
            database: db.is_ok(),
            cache: cache.is_ok(),
        }),
    )
}
