//! API Routes
//!
//! - `/api/chat` - ask a question about the complaint database
//! - `/api/health` - liveness and whether the RAG chain is loaded
//! - `/api/examples` - title, description and starter questions
//! - `/` - minimal browser chat page

pub mod chat;
pub mod health;
pub mod ui;

use crate::middleware::cors_layer;
use crate::models::AppState;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(chat::router(state.clone()))
        .merge(health::router(state))
        .merge(ui::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = create_router(AppState::new(test_config()))
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let response = create_router(AppState::new(test_config()))
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/chat")
                    .header(header::ORIGIN, "http://localhost:7860")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:7860"
        );
    }
}
