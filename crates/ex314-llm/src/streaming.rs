use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::buffer_utils::{FragmentDecoder, PlainTextDecoder, SseChatDecoder};
use crate::error::{LlmError, Result};

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Framing of an upstream reply body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// Raw text chunks that concatenate to the reply
    PlainText,
    /// OpenAI-style `text/event-stream` of `chat.completion.chunk` events
    ChatCompletionSse,
}

impl StreamFormat {
    pub fn decoder(self) -> Box<dyn FragmentDecoder> {
        match self {
            Self::PlainText => Box::new(PlainTextDecoder::new()),
            Self::ChatCompletionSse => Box::new(SseChatDecoder::new()),
        }
    }
}

/// An upstream HTTP reply whose body has not been read yet
pub struct UpstreamReply {
    status: u16,
    body: Option<ByteStream>,
    format: StreamFormat,
}

impl UpstreamReply {
    pub fn new(status: u16, body: Option<ByteStream>, format: StreamFormat) -> Self {
        Self {
            status,
            body,
            format,
        }
    }

    /// Wrap a reqwest response without consuming its body
    pub fn from_response(response: reqwest::Response, format: StreamFormat) -> Self {
        let status = response.status().as_u16();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(LlmError::from));
        Self::new(status, Some(Box::pin(body)), format)
    }

    /// A successful reply whose body yields the given chunks in order
    pub fn from_chunks<I, B>(chunks: I, format: StreamFormat) -> Self
    where
        I: IntoIterator<Item = B>,
        I::IntoIter: Send + 'static,
        B: Into<Bytes>,
    {
        let body = futures::stream::iter(chunks.into_iter().map(|c| Ok(c.into())));
        Self::new(200, Some(Box::pin(body)), format)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// 2xx with a readable body
    pub fn is_available(&self) -> bool {
        (200..300).contains(&self.status) && self.body.is_some()
    }

    /// Check availability, handing back the body stream when usable
    pub fn into_body(self) -> Result<ByteStream> {
        let status = self.status;
        if !(200..300).contains(&status) {
            return Err(LlmError::UpstreamUnavailable {
                status: Some(status),
                reason: "non-success status".to_string(),
            });
        }
        self.body.ok_or_else(|| LlmError::UpstreamUnavailable {
            status: Some(status),
            reason: "response carries no readable body".to_string(),
        })
    }
}

impl fmt::Debug for UpstreamReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamReply")
            .field("status", &self.status)
            .field("has_body", &self.body.is_some())
            .field("format", &self.format)
            .finish()
    }
}
