//! Destination for relayed run events.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Accepts newline-terminated event frames from a streaming relay.
///
/// Sinks that buffer should override [`EventSink::flush`]; the relay calls
/// it after every frame so callers observe partial output promptly.
#[async_trait]
pub trait EventSink: Send {
    /// Write one complete frame.
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Push buffered frames to the consumer.
    async fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl EventSink for Vec<u8> {
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.extend_from_slice(frame);
        Ok(())
    }
}

/// Adapts any async writer (stdout, a file, a socket) into an [`EventSink`].
pub struct WriterSink<W> {
    writer: W,
}

impl<W> WriterSink<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> EventSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.writer.write_all(frame).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.writer.flush().await
    }
}
