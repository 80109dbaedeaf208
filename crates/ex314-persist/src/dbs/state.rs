//! Backend-independent store contents and the operations over them.

use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::error::{PersistError, Result};
use crate::models::{
    snippet, ChatMessage, ChatThread, ExportDocument, ExportedThread, RecentMessage, SearchHit,
    ThreadQuery, ThreadStatus, ThreadUpdate, UsageStats, UserSettings, RECENT_MESSAGES,
};

/// Queries shorter than this return no hits
pub const MIN_SEARCH_CHARS: usize = 2;

#[derive(Debug, Default)]
pub(crate) struct StoreData {
    pub(crate) threads: HashMap<String, ExportedThread>,
    pub(crate) settings: HashMap<String, UserSettings>,
}

impl StoreData {
    pub(crate) fn create_thread(&mut self, user_id: &str, title: Option<String>) -> ChatThread {
        let thread = ChatThread::new(user_id, title);
        self.threads.insert(
            thread.id.clone(),
            ExportedThread {
                thread: thread.clone(),
                messages: Vec::new(),
            },
        );
        thread
    }

    pub(crate) fn get_thread(&self, thread_id: &str) -> Option<ChatThread> {
        self.threads.get(thread_id).map(|r| r.thread.clone())
    }

    pub(crate) fn list_threads(&self, user_id: &str, query: &ThreadQuery) -> Vec<ChatThread> {
        let mut threads: Vec<ChatThread> = self
            .threads
            .values()
            .map(|r| &r.thread)
            .filter(|t| t.user_id == user_id && query.matches(t))
            .cloned()
            .collect();
        query.arrange(&mut threads);
        threads
    }

    pub(crate) fn update_thread(&mut self, thread_id: &str, update: &ThreadUpdate) -> Result<ChatThread> {
        let record = self.record_mut(thread_id)?;
        record.thread.apply(update);
        Ok(record.thread.clone())
    }

    pub(crate) fn delete_thread(&mut self, thread_id: &str) -> Result<()> {
        self.threads
            .remove(thread_id)
            .map(|_| ())
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }

    pub(crate) fn save_message(&mut self, thread_id: &str, message: ChatMessage) -> Result<()> {
        let record = self.record_mut(thread_id)?;
        if record.messages.iter().any(|m| m.id == message.id) {
            return Err(PersistError::DuplicateMessage {
                thread_id: thread_id.to_string(),
                message_id: message.id,
            });
        }
        record.messages.push(message);
        record.thread.touch();
        Ok(())
    }

    pub(crate) fn get_messages(&self, thread_id: &str) -> Result<Vec<ChatMessage>> {
        self.threads
            .get(thread_id)
            .map(|r| r.messages.clone())
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }

    pub(crate) fn replace_messages(&mut self, thread_id: &str, messages: Vec<ChatMessage>) -> Result<()> {
        let mut seen = HashSet::with_capacity(messages.len());
        if let Some(dup) = messages.iter().find(|m| !seen.insert(m.id.as_str())) {
            return Err(PersistError::DuplicateMessage {
                thread_id: thread_id.to_string(),
                message_id: dup.id.clone(),
            });
        }

        let record = self.record_mut(thread_id)?;
        record.messages = messages;
        record.thread.touch();
        Ok(())
    }

    pub(crate) fn search_messages(&self, user_id: &str, query: &str) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        if needle.chars().count() < MIN_SEARCH_CHARS {
            return Vec::new();
        }

        let mut hits: Vec<SearchHit> = self
            .threads
            .values()
            .filter(|r| r.thread.user_id == user_id && r.thread.status != ThreadStatus::Deleted)
            .flat_map(|r| {
                r.messages
                    .iter()
                    .filter(|m| m.content.to_lowercase().contains(&needle))
                    .map(|m| SearchHit {
                        thread_id: r.thread.id.clone(),
                        thread_title: r.thread.title.clone(),
                        message_id: m.id.clone(),
                        role: m.role,
                        timestamp: m.timestamp,
                        snippet: snippet(&m.content),
                    })
            })
            .collect();
        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        hits
    }

    pub(crate) fn get_settings(&self, user_id: &str) -> UserSettings {
        self.settings.get(user_id).cloned().unwrap_or_default()
    }

    pub(crate) fn export_all(&self) -> ExportDocument {
        let mut threads: Vec<ExportedThread> = self.threads.values().cloned().collect();
        threads.sort_by(|a, b| a.thread.created_at.cmp(&b.thread.created_at));
        ExportDocument {
            exported_at: Utc::now(),
            threads,
        }
    }

    pub(crate) fn stats(&self) -> UsageStats {
        let mut users = HashSet::new();
        let mut threads = HashSet::new();
        let mut all: Vec<RecentMessage> = Vec::new();

        for record in self.threads.values().filter(|r| !r.messages.is_empty()) {
            users.insert(record.thread.user_id.as_str());
            threads.insert(record.thread.id.as_str());
            all.extend(record.messages.iter().map(|m| RecentMessage {
                thread_id: record.thread.id.clone(),
                user_id: record.thread.user_id.clone(),
                role: m.role,
                content: m.content.clone(),
                timestamp: m.timestamp,
            }));
        }

        let total_messages = all.len();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all.truncate(RECENT_MESSAGES);

        UsageStats {
            total_messages,
            distinct_users: users.len(),
            distinct_threads: threads.len(),
            recent_messages: all,
        }
    }

    fn record_mut(&mut self, thread_id: &str) -> Result<&mut ExportedThread> {
        self.threads
            .get_mut(thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }
}
