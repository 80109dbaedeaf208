use super::buffering::CircularLineBuffer;
use super::decoder::FragmentDecoder;
use crate::error::{LlmError, Result};
use crate::openai::ChatStreamChunk;

/// Strategy pattern for parsing different SSE payload types
pub trait SseLineParser: Send {
    /// Parse a data line into a text fragment (None when the event carries no text)
    fn parse_data_line(&self, data: &str) -> Result<Option<String>>;

    /// Check if this line signals end of stream
    fn is_done_marker(&self, data: &str) -> bool {
        data == "[DONE]"
    }
}

/// OpenAI-compatible `chat.completion.chunk` payloads (OpenAI, Together AI)
#[derive(Debug, Default, Clone, Copy)]
pub struct ChatCompletionChunkParser;

impl SseLineParser for ChatCompletionChunkParser {
    fn parse_data_line(&self, data: &str) -> Result<Option<String>> {
        let chunk: ChatStreamChunk = serde_json::from_str(data)
            .map_err(|e| LlmError::Decode(format!("Failed to parse chat chunk: {}", e)))?;

        if let Some(error) = chunk.error {
            return Err(LlmError::Decode(format!("Upstream error event: {}", error)));
        }

        Ok(chunk.content().filter(|c| !c.is_empty()).map(str::to_string))
    }
}

/// `text/event-stream` decoder: line framing, `data:` fields and the done marker
pub struct SseChatDecoder<P: SseLineParser = ChatCompletionChunkParser> {
    buffer: CircularLineBuffer,
    parser: P,
    done: bool,
}

impl SseChatDecoder<ChatCompletionChunkParser> {
    pub fn new() -> Self {
        Self::with_parser(ChatCompletionChunkParser)
    }
}

impl Default for SseChatDecoder<ChatCompletionChunkParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SseLineParser> SseChatDecoder<P> {
    pub fn with_parser(parser: P) -> Self {
        Self {
            buffer: CircularLineBuffer::with_capacity(4096),
            parser,
            done: false,
        }
    }

    /// True once the done marker was seen; later bytes are ignored
    pub fn is_done(&self) -> bool {
        self.done
    }

    fn process_line(&mut self, line: &str, out: &mut Vec<String>) -> Result<()> {
        // Blank lines separate events, ':' lines are keep-alive comments
        if line.is_empty() || line.starts_with(':') {
            return Ok(());
        }

        let Some(data) = line.strip_prefix("data:") else {
            // event:, id:, retry: carry nothing we display
            return Ok(());
        };
        let data = data.strip_prefix(' ').unwrap_or(data);

        if self.parser.is_done_marker(data) {
            self.done = true;
            return Ok(());
        }

        if let Some(fragment) = self.parser.parse_data_line(data)? {
            out.push(fragment);
        }
        Ok(())
    }
}

impl<P: SseLineParser> FragmentDecoder for SseChatDecoder<P> {
    fn decode(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        let mut out = Vec::new();
        if self.done {
            return Ok(out);
        }

        self.buffer.extend(chunk);
        while let Some(line) = self.buffer.next_line() {
            let line = line?;
            self.process_line(&line, &mut out)?;
            if self.done {
                break;
            }
        }
        Ok(out)
    }

    fn finish(&mut self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        if self.done {
            return Ok(out);
        }
        if let Some(line) = self.buffer.take_remainder() {
            let line = line?;
            self.process_line(&line, &mut out)?;
        }
        Ok(out)
    }
}
