use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    /// Upstream answered with a non-success status or without a readable body.
    #[error("Upstream unavailable (status {status:?}): {reason}")]
    UpstreamUnavailable {
        status: Option<u16>,
        reason: String,
    },

    /// The reply stream failed after it started. `partial` holds what was assembled so far.
    #[error("Stream interrupted: {reason}")]
    StreamInterrupted {
        partial: String,
        reason: String,
    },

    #[error("Stream cancelled")]
    Cancelled {
        partial: String,
    },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode upstream payload: {0}")]
    Decode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LlmError {
    /// Text assembled before the stream stopped, if any.
    pub fn partial(&self) -> Option<&str> {
        match self {
            Self::StreamInterrupted { partial, .. } | Self::Cancelled { partial } => Some(partial),
            _ => None,
        }
    }

    /// True for failures that happened before any reply text could be produced.
    pub fn is_upstream_failure(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. } | Self::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
