// Relay client for a self-hosted LLM endpoint speaking `{ message, context }`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::streaming::{StreamFormat, UpstreamReply};
use crate::traits::{ChatClient, ChatRequest, ChatResponse};
use crate::types::Message;

/// Client for an endpoint that answers `POST {url}` with `{ "response": ... }`
/// and streams plain text from `POST {url}/stream`.
pub struct RelayClient {
    http_client: reqwest::Client,
    url: String,
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    message: &'a str,
    context: &'a [Message],
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    response: String,
}

impl RelayClient {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        request_timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key))
                    .map_err(|_| LlmError::InvalidConfig("Invalid API key format".to_string()))?,
            );
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }

        let url = url.into();
        if url.is_empty() {
            return Err(LlmError::InvalidConfig("Missing LLM API URL".to_string()));
        }

        Ok(Self {
            http_client: builder.build()?,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Split the request into the prompt and the history that precedes it
    fn split_prompt(request: &ChatRequest) -> Result<(&str, &[Message])> {
        let idx = request
            .messages
            .iter()
            .rposition(|m| matches!(m, Message::Human { .. }))
            .ok_or_else(|| LlmError::InvalidConfig("Request carries no user message".to_string()))?;

        Ok((request.messages[idx].content(), &request.messages[..idx]))
    }
}

#[async_trait]
impl ChatClient for RelayClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let (message, context) = Self::split_prompt(&request)?;

        let response = self
            .http_client
            .post(&self.url)
            .json(&RelayRequest { message, context })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, "LLM API request failed");
            return Err(LlmError::UpstreamUnavailable {
                status: Some(status.as_u16()),
                reason: format!("LLM API failed: {}", status.as_u16()),
            });
        }

        let body: RelayResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(format!("Failed to parse response: {}", e)))?;

        Ok(ChatResponse {
            content: body.response,
            usage: None,
            finish_reason: None,
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<UpstreamReply> {
        let (message, context) = Self::split_prompt(&request)?;

        let response = self
            .http_client
            .post(format!("{}/stream", self.url))
            .json(&RelayRequest { message, context })
            .send()
            .await?;

        Ok(UpstreamReply::from_response(response, StreamFormat::PlainText))
    }
}
