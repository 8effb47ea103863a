// Hugging Face Inference Providers router.
// Serves instruct models such as meta-llama/Llama-3.2-3B-Instruct behind an
// OpenAI-compatible chat completions endpoint, authenticated with an HF token.

use crate::llm::openai::OpenAIAdapter;
use crate::llm::provider::LLMAdapter;
use crate::types::{AppResult, LLMRequest, LLMResponse};
use async_trait::async_trait;

const HF_ROUTER_API_BASE: &str = "https://router.huggingface.co/v1";

pub struct HuggingFaceAdapter {
    inner: OpenAIAdapter,
}

impl HuggingFaceAdapter {
    pub fn new(token: &str) -> Self {
        Self::new_with_api_base(token, HF_ROUTER_API_BASE)
    }

    /// Point at a dedicated Inference Endpoint or a local TGI server
    pub fn new_with_api_base(token: &str, api_base: &str) -> Self {
        Self {
            inner: OpenAIAdapter::new_with_api_base(token, api_base).with_provider_name("huggingface"),
        }
    }

    pub fn api_base(&self) -> &str {
        self.inner.api_base()
    }
}

#[async_trait]
impl LLMAdapter for HuggingFaceAdapter {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        self.inner.create_chat_completion(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LLMMessage;

    #[test]
    fn test_defaults_to_router() {
        assert_eq!(HuggingFaceAdapter::new("hf_x").api_base(), HF_ROUTER_API_BASE);
    }

    #[tokio::test]
    async fn test_sends_token_and_model() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer hf_test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "meta-llama/Llama-3.2-3B-Instruct",
                "temperature": 0.1
            })))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": "Overdraft fees."}, "finish_reason": "stop"}]}"#)
            .create_async()
            .await;

        let adapter = HuggingFaceAdapter::new_with_api_base("hf_test", &server.url());
        let response = adapter
            .create_chat_completion(&LLMRequest {
                model: "meta-llama/Llama-3.2-3B-Instruct".to_string(),
                messages: vec![LLMMessage::user("What do people complain about?")],
                max_tokens: Some(512),
                temperature: Some(0.1),
                system_instruction: None,
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "Overdraft fees.");
    }
}
