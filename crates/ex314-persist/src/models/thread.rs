use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_THREAD_TITLE: &str = "Untitled Chat";

/// Database-agnostic thread model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub status: ThreadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatThread {
    pub fn new(user_id: impl Into<String>, title: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_THREAD_TITLE.to_string()),
            status: ThreadStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: &ThreadUpdate) {
        if let Some(title) = update.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            self.title = title.to_string();
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    #[default]
    Active,
    Starred,
    Archived,
    Deleted,
}

impl ThreadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Starred => "starred",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ThreadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "starred" => Ok(Self::Starred),
            "archived" => Ok(Self::Archived),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("unknown thread status: {}", other)),
        }
    }
}

/// Rename and/or status change
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub status: Option<ThreadStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadSort {
    /// Most recently updated first
    #[default]
    Recent,
    Oldest,
    Title,
}

/// Filters for listing a user's threads
#[derive(Debug, Clone, Default)]
pub struct ThreadQuery {
    pub status: Option<ThreadStatus>,
    /// Case-insensitive substring match on the title
    pub title_contains: Option<String>,
    pub sort: ThreadSort,
    /// Soft-deleted threads are hidden unless asked for (or filtered on explicitly)
    pub include_deleted: bool,
    pub limit: Option<usize>,
}

impl ThreadQuery {
    pub fn matches(&self, thread: &ChatThread) -> bool {
        if let Some(status) = self.status {
            if thread.status != status {
                return false;
            }
        } else if thread.status == ThreadStatus::Deleted && !self.include_deleted {
            return false;
        }

        match self.title_contains.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => thread
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }

    /// Sort and truncate an already filtered list
    pub fn arrange(&self, threads: &mut Vec<ChatThread>) {
        match self.sort {
            ThreadSort::Recent => threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            ThreadSort::Oldest => threads.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            ThreadSort::Title => {
                threads.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            }
        }
        if let Some(limit) = self.limit {
            threads.truncate(limit);
        }
    }
}
