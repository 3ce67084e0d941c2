use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::models::chat::{
    ChatRequest, ChatResponseData, ModerateRequest, ModerationResponseData, SuccessResponse,
    SuggestionsData, SuggestionsQuery,
};
use crate::state::AppState;
use crate::utils::error::ChatError;

pub async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<SuccessResponse<ChatResponseData>>, ChatError> {
    info!(
        "Chat request: conversation={}, message_len={}, region={:?}",
        request.conversation_id,
        request.message.len(),
        request.region
    );

    let outcome = state
        .orchestrator
        .process_chat(&request.conversation_id, &request.message, request.options())
        .await?;

    Ok(Json(SuccessResponse::new(outcome.into())))
}

pub async fn moderate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ModerateRequest>,
) -> Result<Json<SuccessResponse<ModerationResponseData>>, ChatError> {
    if request.message.trim().is_empty() {
        return Err(ChatError::validation("message", "Message is required"));
    }

    let report = state.orchestrator.moderate_message(&request.message).await;
    Ok(Json(SuccessResponse::new(report.into())))
}

pub async fn suggestions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SuggestionsQuery>,
) -> Json<SuccessResponse<SuggestionsData>> {
    let suggestions = state
        .orchestrator
        .suggested_questions(query.region.as_deref());
    Json(SuccessResponse::new(SuggestionsData { suggestions }))
}
