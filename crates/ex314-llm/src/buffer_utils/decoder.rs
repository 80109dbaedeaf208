use super::utf8::Utf8ChunkDecoder;
use crate::error::Result;

/// Decode step turning raw upstream bytes into text fragments.
///
/// Implementations keep whatever state they need across chunks (partial
/// characters, partial lines) and only return complete fragments.
pub trait FragmentDecoder: Send {
    /// Feed one raw chunk and return the fragments it completed
    fn decode(&mut self, chunk: &[u8]) -> Result<Vec<String>>;

    /// Flush buffered state at clean end of stream
    fn finish(&mut self) -> Result<Vec<String>>;
}

/// Raw text body (the relay `/stream` endpoint): every chunk is reply text
#[derive(Debug, Default)]
pub struct PlainTextDecoder {
    utf8: Utf8ChunkDecoder,
}

impl PlainTextDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FragmentDecoder for PlainTextDecoder {
    fn decode(&mut self, chunk: &[u8]) -> Result<Vec<String>> {
        let text = self.utf8.push(chunk);
        Ok(non_empty(text))
    }

    fn finish(&mut self) -> Result<Vec<String>> {
        Ok(non_empty(self.utf8.finish()))
    }
}

fn non_empty(text: String) -> Vec<String> {
    if text.is_empty() {
        Vec::new()
    } else {
        vec![text]
    }
}
