// OpenAI-compatible chat completions client (Together AI, OpenAI, vLLM, ...)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LlmError, Result};
use crate::streaming::{StreamFormat, UpstreamReply};
use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
use crate::types::Message;

pub const TOGETHER_API_BASE: &str = "https://api.together.xyz/v1";

/// OpenAI-compatible client (HTTP direct, no SDK)
pub struct OpenAICompatibleClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAICompatibleClient {
    /// Client for the Together AI endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, TOGETHER_API_BASE, None)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        request_timeout: Option<Duration>,
    ) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| LlmError::InvalidConfig("Invalid API key format".to_string()))?,
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build chat completion request payload
    fn build_chat_request(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
        stream: bool,
    ) -> Result<Value> {
        let mut request = serde_json::json!({
            "model": model,
            "messages": messages,
            "stream": stream,
        });

        if let Value::Object(obj) = &mut request {
            if let Some(temp) = options.temperature {
                obj.insert("temperature".to_string(), serde_json::json!(temp));
            }
            if let Some(max_tokens) = options.max_tokens {
                obj.insert("max_tokens".to_string(), serde_json::json!(max_tokens));
            }
        }

        Ok(request)
    }

    async fn post_completions(&self, payload: &Value) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .json(payload)
            .send()
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl ChatClient for OpenAICompatibleClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload =
            self.build_chat_request(&request.model, &request.messages, &request.options, false)?;

        let response = self.post_completions(&payload).await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %error_text, "Chat completion failed");
            return Err(LlmError::UpstreamUnavailable {
                status: Some(status.as_u16()),
                reason: error_text,
            });
        }

        let raw: ChatCompletion = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(format!("Failed to parse response: {}", e)))?;

        let choice = raw.choices.first();
        Ok(ChatResponse {
            content: choice
                .and_then(|c| c.message.content.clone())
                .unwrap_or_default(),
            usage: raw.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.and_then(|c| c.finish_reason.clone()),
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<UpstreamReply> {
        let payload =
            self.build_chat_request(&request.model, &request.messages, &request.options, true)?;

        let response = self.post_completions(&payload).await?;
        tracing::debug!(status = %response.status(), model = %request.model, "Opened completion stream");

        Ok(UpstreamReply::from_response(response, StreamFormat::ChatCompletionSse))
    }
}

// ============================================================================
// RESPONSE TYPES (non-streaming chat completions)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
