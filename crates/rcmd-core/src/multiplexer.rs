//! Operator-facing output sink

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Writes merged lines to the operator stream as they arrive
///
/// Every line is flushed immediately; content is written unchanged.
#[derive(Debug)]
pub struct Multiplexer<W> {
    writer: W,
    lines_written: u64,
}

impl<W: AsyncWrite + Unpin> Multiplexer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_written: 0,
        }
    }

    /// Write one line exactly as received
    ///
    /// # Errors
    /// Returns the underlying write or flush error
    pub async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.write_raw(line).await?;
        self.lines_written += 1;
        Ok(())
    }

    pub(crate) async fn write_raw(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await
    }

    /// Number of lines written so far
    #[must_use]
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
