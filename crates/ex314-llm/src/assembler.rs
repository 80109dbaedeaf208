//! Incremental assembly of a streamed assistant reply.
//!
//! The assembler reads an upstream body chunk by chunk, runs each chunk through a
//! [`FragmentDecoder`] and republishes the growing reply through a callback that
//! receives `(fragment, full_text_so_far)`. Every `full_text_so_far` is the previous
//! one with text appended.
//!
//! Lifecycle: `Pending -> Streaming -> {Completed | Failed | Cancelled}`.

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::buffer_utils::FragmentDecoder;
use crate::error::{LlmError, Result};
use crate::streaming::UpstreamReply;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerState {
    Pending,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl AssemblerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

pub struct StreamingReplyAssembler {
    decoder: Option<Box<dyn FragmentDecoder>>,
    cancel: CancellationToken,
    state: AssemblerState,
}

impl Default for StreamingReplyAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingReplyAssembler {
    /// Assembler decoding with the reply's own [`StreamFormat`](crate::StreamFormat)
    pub fn new() -> Self {
        Self {
            decoder: None,
            cancel: CancellationToken::new(),
            state: AssemblerState::Pending,
        }
    }

    /// Use a custom decode step for the next run instead of the reply's format
    pub fn with_decoder(mut self, decoder: Box<dyn FragmentDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Share an existing cancellation token (e.g. one owned by the request)
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle that stops the read loop when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Consume `reply`, invoking `on_fragment(fragment, full_text)` for every decoded
    /// fragment, and resolve with the full text at clean end of stream.
    ///
    /// Fails with [`LlmError::UpstreamUnavailable`] before any callback when the reply
    /// is not usable, [`LlmError::StreamInterrupted`] when reading or decoding breaks,
    /// and [`LlmError::Cancelled`] once the token fires. No callback runs after
    /// cancellation, even for fragments already decoded from buffered bytes.
    pub async fn assemble<F>(&mut self, reply: UpstreamReply, mut on_fragment: F) -> Result<String>
    where
        F: FnMut(&str, &str),
    {
        self.state = AssemblerState::Pending;
        let cancel = self.cancel.clone();
        let mut decoder = match self.decoder.take() {
            Some(decoder) => decoder,
            None => reply.format().decoder(),
        };

        let mut body = match reply.into_body() {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(error = %e, "Upstream reply unavailable");
                self.state = AssemblerState::Failed;
                return Err(e);
            }
        };

        if cancel.is_cancelled() {
            return Err(self.cancelled(String::new()));
        }

        self.state = AssemblerState::Streaming;
        let mut full = String::new();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(full)),
                next = body.next() => next,
            };

            let (decoded, finished) = match next {
                Some(Ok(bytes)) => (decoder.decode(&bytes), false),
                Some(Err(e)) => return Err(self.interrupted(full, e)),
                None => (decoder.finish(), true),
            };

            let fragments = match decoded {
                Ok(fragments) => fragments,
                Err(e) => return Err(self.interrupted(full, e)),
            };

            for fragment in fragments.iter().filter(|f| !f.is_empty()) {
                if cancel.is_cancelled() {
                    return Err(self.cancelled(full));
                }
                full.push_str(fragment);
                on_fragment(fragment, &full);
            }

            if finished {
                tracing::debug!(chars = full.chars().count(), "Reply stream completed");
                self.state = AssemblerState::Completed;
                return Ok(full);
            }
        }
    }

    fn cancelled(&mut self, partial: String) -> LlmError {
        tracing::debug!(partial_chars = partial.chars().count(), "Reply stream cancelled");
        self.state = AssemblerState::Cancelled;
        LlmError::Cancelled { partial }
    }

    fn interrupted(&mut self, partial: String, cause: LlmError) -> LlmError {
        tracing::warn!(error = %cause, partial_chars = partial.chars().count(), "Reply stream interrupted");
        self.state = AssemblerState::Failed;
        LlmError::StreamInterrupted {
            partial,
            reason: cause.to_string(),
        }
    }
}
