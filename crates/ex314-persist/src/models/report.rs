use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatThread, MessageRole};

pub const SNIPPET_CHARS: usize = 120;
pub const RECENT_MESSAGES: usize = 10;

/// Every thread with its messages, as served by the admin export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub exported_at: DateTime<Utc>,
    pub threads: Vec<ExportedThread>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedThread {
    #[serde(flatten)]
    pub thread: ChatThread,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub thread_id: String,
    pub thread_title: String,
    pub message_id: String,
    pub role: MessageRole,
    pub timestamp: DateTime<Utc>,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_messages: usize,
    /// Users with at least one message
    pub distinct_users: usize,
    /// Threads with at least one message
    pub distinct_threads: usize,
    /// Newest first
    pub recent_messages: Vec<RecentMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentMessage {
    pub thread_id: String,
    pub user_id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// First [`SNIPPET_CHARS`] characters, with `...` when cut
pub fn snippet(content: &str) -> String {
    match content.char_indices().nth(SNIPPET_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet() {
        assert_eq!(snippet("short"), "short");

        let exact = "x".repeat(SNIPPET_CHARS);
        assert_eq!(snippet(&exact), exact);

        let long = "é".repeat(SNIPPET_CHARS + 5);
        let cut = snippet(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), SNIPPET_CHARS + 3);
    }
}
