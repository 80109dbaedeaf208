mod buffering;
mod decoder;
mod sse_parser;
mod utf8;

pub use buffering::CircularLineBuffer;
pub use decoder::{FragmentDecoder, PlainTextDecoder};
pub use sse_parser::{ChatCompletionChunkParser, SseChatDecoder, SseLineParser};
pub use utf8::Utf8ChunkDecoder;
