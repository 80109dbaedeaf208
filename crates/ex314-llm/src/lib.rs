pub mod types;
pub mod traits;
pub mod streaming;
pub mod assembler;
pub mod buffer_utils;
pub mod openai;
pub mod relay;
pub mod config;
pub mod error;

pub use traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};

pub use assembler::{AssemblerState, StreamingReplyAssembler};
pub use buffer_utils::{FragmentDecoder, PlainTextDecoder, SseChatDecoder};
pub use config::{ClientFactory, ProviderConfig, ProviderDetails, ProviderType};
pub use error::{LlmError, Result};
pub use openai::{OpenAICompatibleClient, TOGETHER_API_BASE};
pub use relay::RelayClient;
pub use streaming::{ByteStream, StreamFormat, UpstreamReply};
pub use types::Message;
