mod chunk;
mod client;

pub use chunk::{ChatStreamChunk, Delta, StreamChoice};
pub use client::{OpenAICompatibleClient, TOGETHER_API_BASE};
