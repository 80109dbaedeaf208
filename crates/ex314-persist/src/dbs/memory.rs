use async_trait::async_trait;
use tokio::sync::RwLock;

use super::state::StoreData;
use crate::error::Result;
use crate::models::{
    ChatMessage, ChatThread, ExportDocument, SearchHit, ThreadQuery, ThreadUpdate, UsageStats,
    UserSettings,
};
use crate::trait_client::PersistenceClient;

/// Process-local store; contents vanish with the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceClient for MemoryStore {
    async fn create_thread(&self, user_id: &str, title: Option<String>) -> Result<ChatThread> {
        Ok(self.data.write().await.create_thread(user_id, title))
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ChatThread>> {
        Ok(self.data.read().await.get_thread(thread_id))
    }

    async fn list_threads(&self, user_id: &str, query: &ThreadQuery) -> Result<Vec<ChatThread>> {
        Ok(self.data.read().await.list_threads(user_id, query))
    }

    async fn update_thread(&self, thread_id: &str, update: ThreadUpdate) -> Result<ChatThread> {
        self.data.write().await.update_thread(thread_id, &update)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.data.write().await.delete_thread(thread_id)
    }

    async fn save_message(&self, thread_id: &str, message: ChatMessage) -> Result<()> {
        self.data.write().await.save_message(thread_id, message)
    }

    async fn get_messages(&self, thread_id: &str) -> Result<Vec<ChatMessage>> {
        self.data.read().await.get_messages(thread_id)
    }

    async fn replace_messages(&self, thread_id: &str, messages: Vec<ChatMessage>) -> Result<()> {
        self.data.write().await.replace_messages(thread_id, messages)
    }

    async fn search_messages(&self, user_id: &str, query: &str) -> Result<Vec<SearchHit>> {
        Ok(self.data.read().await.search_messages(user_id, query))
    }

    async fn get_settings(&self, user_id: &str) -> Result<UserSettings> {
        Ok(self.data.read().await.get_settings(user_id))
    }

    async fn save_settings(&self, user_id: &str, settings: UserSettings) -> Result<()> {
        self.data
            .write()
            .await
            .settings
            .insert(user_id.to_string(), settings);
        Ok(())
    }

    async fn export_all(&self) -> Result<ExportDocument> {
        Ok(self.data.read().await.export_all())
    }

    async fn stats(&self) -> Result<UsageStats> {
        Ok(self.data.read().await.stats())
    }
}
