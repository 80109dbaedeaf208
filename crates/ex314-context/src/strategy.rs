use anyhow::Result;
use async_trait::async_trait;
use ex314_llm::Message;
use ex314_persist::PersistenceClient;

/// Result of context retrieval
#[derive(Debug, Clone)]
pub struct ContextWindow {
    pub system_prompt: String,
    pub messages: Vec<Message>,
}

impl ContextWindow {
    /// System prompt followed by the selected history, ready for the provider
    pub fn into_messages(self) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if !self.system_prompt.is_empty() {
            out.push(Message::system(self.system_prompt));
        }
        out.extend(self.messages);
        out
    }
}

/// Strategy for choosing which history goes upstream with a prompt
#[async_trait]
pub trait ContextStrategy: Send + Sync {
    /// Trim a client-supplied history (newest last)
    fn select(&self, history: Vec<Message>) -> Vec<Message>;

    /// Context for the next reply in a stored thread, including its newest message
    async fn get_context_window(
        &self,
        thread_id: &str,
        persist_client: &dyn PersistenceClient,
        ai_tone: &str,
    ) -> Result<ContextWindow>;
}
