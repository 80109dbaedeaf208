use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    ChatMessage, ChatThread, ExportDocument, SearchHit, ThreadQuery, ThreadUpdate, UsageStats,
    UserSettings,
};

/// Trait for persistence operations
///
/// Implementations are key-value style backends; ownership checks are the caller's job.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create a new thread titled "Untitled Chat" unless a title is given
    async fn create_thread(&self, user_id: &str, title: Option<String>) -> Result<ChatThread>;

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ChatThread>>;

    /// List a user's threads
    async fn list_threads(&self, user_id: &str, query: &ThreadQuery) -> Result<Vec<ChatThread>>;

    async fn update_thread(&self, thread_id: &str, update: ThreadUpdate) -> Result<ChatThread>;

    /// Remove a thread and all its messages
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// Append a message; fails on a duplicate id within the thread
    async fn save_message(&self, thread_id: &str, message: ChatMessage) -> Result<()>;

    /// All messages of a thread, oldest first
    async fn get_messages(&self, thread_id: &str) -> Result<Vec<ChatMessage>>;

    /// Replace a thread's messages wholesale
    async fn replace_messages(&self, thread_id: &str, messages: Vec<ChatMessage>) -> Result<()>;

    /// Case-insensitive content search over a user's threads
    async fn search_messages(&self, user_id: &str, query: &str) -> Result<Vec<SearchHit>>;

    /// Stored settings, or the defaults for a user who never saved any
    async fn get_settings(&self, user_id: &str) -> Result<UserSettings>;

    async fn save_settings(&self, user_id: &str, settings: UserSettings) -> Result<()>;

    /// Every thread with its messages
    async fn export_all(&self) -> Result<ExportDocument>;

    async fn stats(&self) -> Result<UsageStats>;
}
