use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tiktoken_rs::{cl100k_base, CoreBPE};

use ex314_llm::Message;
use ex314_persist::PersistenceClient;

use crate::strategy::{ContextStrategy, ContextWindow};
use crate::templates::{render_system_prompt, DEFAULT_SYSTEM_PROMPT_TEMPLATE};

pub const DEFAULT_MAX_MESSAGES: usize = 10;
pub const DEFAULT_MAX_TOKENS: usize = 8_000;

/// Role and framing tokens the chat format adds around every message
const MESSAGE_OVERHEAD_TOKENS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    /// Only the last `max_messages`
    #[default]
    Trailing,
    /// Entire history, still subject to the token budget
    Full,
}

/// Keeps the newest messages: first by count, then by token budget.
///
/// Trimming always happens from the oldest end and never removes the newest
/// message, so the prompt being answered is always sent.
pub struct TrailingWindowStrategy {
    mode: WindowMode,
    max_messages: usize,
    max_tokens: usize,
    system_prompt_template: String,
    bpe: CoreBPE,
}

impl TrailingWindowStrategy {
    pub fn new(max_messages: usize, max_tokens: usize) -> Result<Self> {
        let bpe = cl100k_base().map_err(|e| anyhow::anyhow!("Tokenizer error: {}", e))?;
        Ok(Self {
            mode: WindowMode::Trailing,
            max_messages: max_messages.max(1),
            max_tokens,
            system_prompt_template: DEFAULT_SYSTEM_PROMPT_TEMPLATE.to_string(),
            bpe,
        })
    }

    pub fn with_mode(mut self, mode: WindowMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_system_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.system_prompt_template = template.into();
        self
    }

    pub fn mode(&self) -> WindowMode {
        self.mode
    }

    /// Count tokens using tiktoken
    pub fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    fn message_tokens(&self, message: &Message) -> usize {
        self.count_tokens(message.content()) + MESSAGE_OVERHEAD_TOKENS
    }

    /// Apply the count window, then drop oldest messages until `reserved` plus the
    /// remaining messages fit in the token budget
    fn trim(&self, history: Vec<Message>, reserved: usize) -> Vec<Message> {
        let mut window: Vec<Message> = match self.mode {
            WindowMode::Trailing => {
                let skip = history.len().saturating_sub(self.max_messages);
                history.into_iter().skip(skip).collect()
            }
            WindowMode::Full => history,
        };

        let costs: Vec<usize> = window.iter().map(|m| self.message_tokens(m)).collect();
        let mut total = reserved + costs.iter().sum::<usize>();
        let mut dropped = 0;
        while total > self.max_tokens && dropped + 1 < window.len() {
            total -= costs[dropped];
            dropped += 1;
        }

        if dropped > 0 {
            tracing::debug!(
                dropped,
                kept = window.len() - dropped,
                tokens = total,
                max_tokens = self.max_tokens,
                "Trimmed context to token budget"
            );
            window.drain(..dropped);
        }
        window
    }
}

#[async_trait]
impl ContextStrategy for TrailingWindowStrategy {
    fn select(&self, history: Vec<Message>) -> Vec<Message> {
        self.trim(history, 0)
    }

    async fn get_context_window(
        &self,
        thread_id: &str,
        persist_client: &dyn PersistenceClient,
        ai_tone: &str,
    ) -> Result<ContextWindow> {
        let stored = persist_client.get_messages(thread_id).await?;
        let system_prompt = render_system_prompt(&self.system_prompt_template, ai_tone);

        let reserved = self.count_tokens(&system_prompt) + MESSAGE_OVERHEAD_TOKENS;
        let history: Vec<Message> = stored.iter().map(Message::from).collect();
        let messages = self.trim(history, reserved);

        tracing::debug!(
            thread_id = %thread_id,
            stored = stored.len(),
            selected = messages.len(),
            "Built context window"
        );

        Ok(ContextWindow {
            system_prompt,
            messages,
        })
    }
}
