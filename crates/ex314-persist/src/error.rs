use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Duplicate message id {message_id} in thread {thread_id}")]
    DuplicateMessage {
        thread_id: String,
        message_id: String,
    },

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;
