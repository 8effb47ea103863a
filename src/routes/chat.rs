use crate::models::{AppState, ChatRequest, ChatResponse};
use crate::rag::{format_chat_reply, source_snippets, validate_query};
use crate::types::AppResult;
use axum::{extract::State, routing::post, Json, Router};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(post_chat))
        .with_state(state)
}

pub async fn post_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let started = Instant::now();
    let message_id = Uuid::new_v4();
    let query = validate_query(request.message.text())?;
    info!(%message_id, query, "Received chat request");

    let chain = state.rag_chain().await?;
    let response = chain.invoke(query).await?;

    let reply = ChatResponse {
        message_id,
        text: format_chat_reply(&response),
        sources: source_snippets(&response),
        answer: response.result,
        response_time: started.elapsed().as_millis() as u64,
    };

    info!(
        %message_id,
        sources = reply.sources.len(),
        response_time_ms = reply.response_time,
        "Chat response sent"
    );
    Ok(Json(reply))
}
