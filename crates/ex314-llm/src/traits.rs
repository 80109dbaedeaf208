use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::streaming::UpstreamReply;
use crate::types::Message;

/// Trait for chat-based LLM interactions
///
/// Provides both a settled completion and a raw streaming reply for the assembler.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Non-streaming chat completion
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Open a streaming chat completion.
    ///
    /// The upstream reply is handed back untouched, unsuccessful statuses included;
    /// deciding whether it is usable is the assembler's job. Only transport failures
    /// (connect, TLS, timeouts) are returned as errors here.
    async fn chat_stream(&self, request: ChatRequest) -> Result<UpstreamReply>;
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// The newest user message, i.e. the prompt being answered
    pub fn prompt(&self) -> Option<&str> {
        self.messages.iter().rev().find_map(|m| match m {
            Message::Human { content } => Some(content.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}
