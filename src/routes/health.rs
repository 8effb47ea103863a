use crate::models::{AppState, ExamplesResponse, HealthResponse, APP_DESCRIPTION, APP_TITLE, EXAMPLE_QUESTIONS};
use axum::{extract::State, routing::get, Json, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/examples", get(examples))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        index_loaded: state.chain_loaded(),
        llm_provider: state.config.llm.provider.to_string(),
        llm_model: state.config.llm.model.clone(),
    })
}

async fn examples() -> Json<ExamplesResponse> {
    Json(ExamplesResponse {
        title: APP_TITLE,
        description: APP_DESCRIPTION,
        examples: EXAMPLE_QUESTIONS.to_vec(),
    })
}
