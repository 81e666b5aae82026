//! Newline-delimited JSON framing.
//!
//! Each JSON-RPC message occupies exactly one line. The transport is generic
//! over its reader and writer so the same code drives a child process's pipes,
//! the current process's stdin/stdout, or a `tokio::io::duplex` pair.

use crate::error::McpError;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};

pub struct LineTransport<R, W> {
    lines: Lines<BufReader<R>>,
    writer: W,
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    /// Serialize `message` onto a single line and flush it.
    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<(), McpError> {
        let mut line = serde_json::to_string(message)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Next non-blank line, or `None` once the peer closes its end.
    pub async fn recv_line(&mut self) -> Result<Option<String>, McpError> {
        while let Some(line) = self.lines.next_line().await? {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
        Ok(None)
    }

    /// Flush and shut down the write half.
    pub async fn shutdown(&mut self) -> Result<(), McpError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
