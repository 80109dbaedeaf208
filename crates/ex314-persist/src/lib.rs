pub mod dbs;
pub mod environment;
pub mod error;
pub mod models;
pub mod trait_client;

pub use dbs::{FileStore, MemoryStore, MIN_SEARCH_CHARS};
pub use environment::{open_store, StorageEnvironment};
pub use error::{PersistError, Result};
pub use models::{
    ChatMessage, ChatThread, ExportDocument, ExportedThread, MessageRole, RecentMessage, SearchHit,
    ThreadQuery, ThreadSort, ThreadStatus, ThreadUpdate, UsageStats, UserSettings,
    DEFAULT_THREAD_TITLE,
};
pub use trait_client::PersistenceClient;
