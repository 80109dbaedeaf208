pub mod message;
pub mod report;
pub mod settings;
pub mod thread;

pub use message::{ChatMessage, MessageRole};
pub use report::{
    snippet, ExportDocument, ExportedThread, RecentMessage, SearchHit, UsageStats, RECENT_MESSAGES,
    SNIPPET_CHARS,
};
pub use settings::UserSettings;
pub use thread::{ChatThread, ThreadQuery, ThreadSort, ThreadStatus, ThreadUpdate, DEFAULT_THREAD_TITLE};
