use axum::{extract::State, Json};
use std::sync::Arc;

use crate::models::chat::SuccessResponse;
use crate::services::cache::CacheStats;
use crate::state::AppState;
use crate::utils::error::ChatError;

pub async fn cache_stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessResponse<CacheStats>>, ChatError> {
    let stats = state
        .orchestrator
        .cache_stats()
        .await
        .map_err(|e| ChatError::Internal(format!("{:#}", e)))?;
    Ok(Json(SuccessResponse::new(stats)))
}
