use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::state::StoreData;
use crate::error::{PersistError, Result};
use crate::models::{
    ChatMessage, ChatThread, ExportDocument, ExportedThread, SearchHit, ThreadQuery, ThreadUpdate,
    UsageStats, UserSettings,
};
use crate::trait_client::PersistenceClient;

const THREADS_DIR: &str = "threads";
const SETTINGS_DIR: &str = "settings";

/// Durable store: one JSON document per thread (with its messages) and one per
/// user's settings, under `base_path`. Everything is loaded on open and every
/// mutation rewrites the affected document atomically.
#[derive(Debug)]
pub struct FileStore {
    base_path: PathBuf,
    data: Mutex<StoreData>,
}

impl FileStore {
    pub async fn open(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        tokio::fs::create_dir_all(base_path.join(THREADS_DIR)).await?;
        tokio::fs::create_dir_all(base_path.join(SETTINGS_DIR)).await?;

        let mut data = StoreData::default();
        for (id, content) in read_documents(&base_path.join(THREADS_DIR)).await? {
            let record: ExportedThread = serde_json::from_str(&content)?;
            if record.thread.id != id {
                tracing::warn!(file = %id, thread_id = %record.thread.id, "Thread file name does not match its id");
            }
            data.threads.insert(record.thread.id.clone(), record);
        }
        for (user_id, content) in read_documents(&base_path.join(SETTINGS_DIR)).await? {
            data.settings.insert(user_id, serde_json::from_str(&content)?);
        }

        tracing::info!(
            path = %base_path.display(),
            threads = data.threads.len(),
            "Opened file store"
        );

        Ok(Self {
            base_path,
            data: Mutex::new(data),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn document_path(&self, dir: &str, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.base_path.join(dir).join(format!("{}.json", id)))
    }

    /// Apply `change` to one thread and write it out; on a failed write the
    /// thread is restored so memory keeps matching disk
    async fn change_thread<T>(
        &self,
        thread_id: &str,
        change: impl FnOnce(&mut StoreData) -> Result<T>,
    ) -> Result<T> {
        let mut data = self.data.lock().await;
        let snapshot = data.threads.get(thread_id).cloned();
        let value = change(&mut *data)?;
        if let Err(e) = self.flush_thread(&data, thread_id).await {
            match snapshot {
                Some(record) => data.threads.insert(thread_id.to_string(), record),
                None => data.threads.remove(thread_id),
            };
            return Err(e);
        }
        Ok(value)
    }

    async fn flush_thread(&self, data: &StoreData, thread_id: &str) -> Result<()> {
        let path = self.document_path(THREADS_DIR, thread_id)?;
        match data.threads.get(thread_id) {
            Some(record) => write_atomic(&path, record).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PersistenceClient for FileStore {
    async fn create_thread(&self, user_id: &str, title: Option<String>) -> Result<ChatThread> {
        let mut data = self.data.lock().await;
        let thread = data.create_thread(user_id, title);
        if let Err(e) = self.flush_thread(&data, &thread.id).await {
            data.threads.remove(&thread.id);
            return Err(e);
        }
        Ok(thread)
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<ChatThread>> {
        Ok(self.data.lock().await.get_thread(thread_id))
    }

    async fn list_threads(&self, user_id: &str, query: &ThreadQuery) -> Result<Vec<ChatThread>> {
        Ok(self.data.lock().await.list_threads(user_id, query))
    }

    async fn update_thread(&self, thread_id: &str, update: ThreadUpdate) -> Result<ChatThread> {
        self.change_thread(thread_id, |data| data.update_thread(thread_id, &update))
            .await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let path = self.document_path(THREADS_DIR, thread_id)?;
        let mut data = self.data.lock().await;
        if !data.threads.contains_key(thread_id) {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }
        // forget the thread only once its file is gone
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        data.delete_thread(thread_id)
    }

    async fn save_message(&self, thread_id: &str, message: ChatMessage) -> Result<()> {
        self.change_thread(thread_id, |data| data.save_message(thread_id, message))
            .await
    }

    async fn get_messages(&self, thread_id: &str) -> Result<Vec<ChatMessage>> {
        self.data.lock().await.get_messages(thread_id)
    }

    async fn replace_messages(&self, thread_id: &str, messages: Vec<ChatMessage>) -> Result<()> {
        self.change_thread(thread_id, |data| data.replace_messages(thread_id, messages))
            .await
    }

    async fn search_messages(&self, user_id: &str, query: &str) -> Result<Vec<SearchHit>> {
        Ok(self.data.lock().await.search_messages(user_id, query))
    }

    async fn get_settings(&self, user_id: &str) -> Result<UserSettings> {
        Ok(self.data.lock().await.get_settings(user_id))
    }

    async fn save_settings(&self, user_id: &str, settings: UserSettings) -> Result<()> {
        let path = self.document_path(SETTINGS_DIR, user_id)?;
        let mut data = self.data.lock().await;
        write_atomic(&path, &settings).await?;
        data.settings.insert(user_id.to_string(), settings);
        Ok(())
    }

    async fn export_all(&self) -> Result<ExportDocument> {
        Ok(self.data.lock().await.export_all())
    }

    async fn stats(&self) -> Result<UsageStats> {
        Ok(self.data.lock().await.stats())
    }
}

/// Reject ids that are unsafe as file names: path separators, `..`, control characters
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(PersistError::InvalidId("id cannot be empty".to_string()));
    }
    if id.contains('/') || id.contains('\\') || id.contains("..") || id.chars().any(|c| c.is_control()) {
        return Err(PersistError::InvalidId(format!(
            "id contains invalid characters: {id:?}"
        )));
    }
    Ok(())
}

/// `(file stem, contents)` of every `*.json` in `dir`
async fn read_documents(dir: &Path) -> Result<Vec<(String, String)>> {
    let mut documents = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            documents.push((stem.to_string(), tokio::fs::read_to_string(&path).await?));
        }
    }
    Ok(documents)
}

async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    let dir = path
        .parent()
        .ok_or_else(|| PersistError::Internal(format!("no parent directory for {}", path.display())))?;
    let tmp_path = dir.join(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));

    let write_result = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;

    if let Err(e) = write_result {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    Ok(())
}
