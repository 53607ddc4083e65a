//! Incremental whitespace tokenisation over arbitrarily chunked byte streams.

/// Returns `true` for the bytes that separate words: space, `\t`, `\n`, vertical tab,
/// form feed and `\r`.
///
/// Both the text splitter and the persisted chain format use this definition.
#[must_use]
pub fn is_separator(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\x0B' | b'\x0C' | b'\r')
}

/// Splits byte chunks into whitespace-separated raw words.
///
/// A token cut by a chunk boundary is held back and completed by the next chunk, so the
/// emitted words do not depend on how the input was chunked.
#[derive(Debug, Default, Clone)]
pub struct WordSplitter {
    pending: Vec<u8>,
}

impl WordSplitter {
    /// Creates a splitter with no buffered partial token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and hands every completed token to `emit`.
    ///
    /// Stops at the first error returned by `emit`; the remaining input of the chunk is
    /// discarded in that case.
    pub fn feed<E, F>(&mut self, chunk: &[u8], mut emit: F) -> Result<(), E>
    where
        F: FnMut(&[u8]) -> Result<(), E>,
    {
        let mut start = 0;
        for (idx, byte) in chunk.iter().enumerate() {
            if !is_separator(*byte) {
                continue;
            }
            if self.pending.is_empty() {
                if idx > start {
                    emit(&chunk[start..idx])?;
                }
            } else {
                self.pending.extend_from_slice(&chunk[start..idx]);
                let token = std::mem::take(&mut self.pending);
                emit(&token)?;
            }
            start = idx + 1;
        }
        self.pending.extend_from_slice(&chunk[start..]);
        Ok(())
    }

    /// Returns the buffered trailing token, if any, leaving the splitter empty.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    /// Returns `true` when a partial token is buffered.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
