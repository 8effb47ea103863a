// Shared handling of error responses from hosted model APIs

use crate::types::{AppError, AppResult};
use reqwest::Response;
use serde::Deserialize;

// HF returns {"error": "..."}, OpenAI-style APIs return {"error": {"message": "..."}}.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Detailed { error: ErrorDetail },
    Plain { error: String },
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

pub(crate) fn extract_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Detailed { error }) => error.message,
        Ok(ErrorBody::Plain { error }) => error,
        Err(_) => body.trim().to_string(),
    }
}

/// Pass successful responses through; turn anything else into `AppError::Upstream`.
pub async fn check_status(provider: &str, response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::Upstream {
        provider: provider.to_string(),
        status: status.as_u16(),
        message: extract_error_message(&body),
    })
}
