// OpenAI chat completions over plain reqwest.
// Also the wire format behind the Hugging Face router, OpenRouter, Groq and
// self-hosted servers (vLLM, llama.cpp, Ollama), which wrap this adapter.

use crate::llm::{AppResult, LLMAdapter, LLMRequest, LLMResponse};
use crate::types::{AppError, LLMMessage, TokenUsage};
use crate::utils::{check_status, with_retry, RetryPolicy};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

pub struct OpenAIAdapter {
    client: Client,
    api_key: String,
    api_base: String,
    provider: &'static str,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<&'a LLMMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl OpenAIAdapter {
    pub fn new(api_key: &str) -> Self {
        Self::new_with_api_base(api_key, OPENAI_API_BASE)
    }

    pub fn new_with_api_base(api_key: &str, api_base: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            provider: "openai",
            retry: RetryPolicy::default(),
        }
    }

    /// Name used in error messages and logs
    pub fn with_provider_name(mut self, provider: &'static str) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn send(&self, body: &ChatRequest<'_>) -> AppResult<ChatResponse> {
        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .json(body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = check_status(self.provider, request.send().await?).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl LLMAdapter for OpenAIAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let system = request.system_instruction.as_ref().map(LLMMessage::system);
        let messages: Vec<&LLMMessage> = system.iter().chain(request.messages.iter()).collect();

        let body = ChatRequest {
            model: &request.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: false,
        };

        debug!(provider = self.provider, model = %request.model, "Sending chat completion");
        let response = with_retry(self.retry, || self.send(&body)).await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            AppError::LLMApi(format!("{} returned no choices", self.provider))
        })?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn request() -> LLMRequest {
        LLMRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![LLMMessage::user("Why was my card declined?")],
            max_tokens: Some(512),
            temperature: Some(0.1),
            system_instruction: None,
        }
    }

    #[tokio::test]
    async fn test_chat_completion_parses_first_choice() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o-mini",
                "max_tokens": 512,
                "stream": false,
                "messages": [{"role": "user", "content": "Why was my card declined?"}]
            })))
            .with_status(200)
            .with_body(
                r#"{"id": "cmpl-1", "choices": [
                    {"index": 0, "message": {"role": "assistant", "content": "Most declines cite fraud holds."}, "finish_reason": "stop"}
                ], "usage": {"prompt_tokens": 12, "completion_tokens": 6, "total_tokens": 18}}"#,
            )
            .create_async()
            .await;

        let adapter = OpenAIAdapter::new_with_api_base("sk-test", &server.url());
        let response = adapter.create_chat_completion(&request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "Most declines cite fraud holds.");
        assert_eq!(response.finish_reason, "stop");
        assert_eq!(response.usage.total_tokens, 18);
    }

    #[tokio::test]
    async fn test_system_instruction_is_sent_first() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Why was my card declined?"}
                ]
            })))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "Fraud hold."}}]}"#)
            .create_async()
            .await;

        let mut req = request();
        req.system_instruction = Some("Be brief.".to_string());
        let adapter = OpenAIAdapter::new_with_api_base("", &server.url());
        let response = adapter.create_chat_completion(&req).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "Fraud hold.");
        assert_eq!(response.finish_reason, "stop");
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let adapter = OpenAIAdapter::new_with_api_base("sk-test", &server.url());
        let err = adapter.create_chat_completion(&request()).await.unwrap_err();
        assert!(matches!(err, AppError::LLMApi(_)));
    }

    #[tokio::test]
    async fn test_provider_error_message_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(404)
            .with_body(r#"{"error": {"message": "The model `gpt-9` does not exist", "type": "invalid_request_error"}}"#)
            .create_async()
            .await;

        let adapter = OpenAIAdapter::new_with_api_base("sk-test", &server.url())
            .with_provider_name("groq")
            .with_retry_policy(RetryPolicy::none());
        let err = adapter.create_chat_completion(&request()).await.unwrap_err();

        match err {
            AppError::Upstream {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, "groq");
                assert_eq!(status, 404);
                assert_eq!(message, "The model `gpt-9` does not exist");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
