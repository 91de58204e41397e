//! Newline framing for chunked channel data

/// Accumulates raw output chunks and hands back complete lines
///
/// Lines keep their trailing `\n`. Invalid UTF-8 is replaced lossily.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk as received from the transport
    pub fn extend(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    /// Pop the oldest complete line, if any
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Drop an unterminated tail at end-of-stream
    ///
    /// Only complete lines are ever forwarded. Returns the number of bytes
    /// discarded.
    pub fn discard_tail(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}
