use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::protocol::SendError;

/// The sending half of a buffered channel.
///
/// Small writes are coalesced into one region of `capacity` bytes and reach the socket
/// when the region would overflow or on [`flush`](Self::flush). A single write larger
/// than the whole region bypasses it.
#[derive(Debug)]
pub struct WriteChannel<W> {
    writer: W,
    buffer: BytesMut,
    capacity: usize,
}

impl<W> WriteChannel<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(capacity), capacity }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of accumulated bytes not yet sent.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), SendError> {
        if bytes.is_empty() {
            return Ok(());
        }

        if !self.buffer.is_empty() && self.buffer.len() + bytes.len() > self.capacity {
            self.write_buffered().await?;
        }

        if bytes.len() > self.capacity {
            trace!(bytes = bytes.len(), "write channel sending oversized write directly");
            self.writer.write_all(bytes).await?;
        } else {
            self.buffer.extend_from_slice(bytes);
        }

        Ok(())
    }

    /// Sends the accumulated bytes and empties the accumulation region.
    pub async fn flush(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.write_buffered().await?;
        Ok(self.writer.flush().await?)
    }

    /// Shuts down the write direction of the underlying stream.
    pub async fn shutdown(&mut self) -> Result<(), SendError> {
        self.writer.shutdown().await.map_err(SendError::io)
    }

    async fn write_buffered(&mut self) -> Result<(), SendError> {
        trace!(bytes = self.buffer.len(), "write channel sending buffered bytes");
        self.writer.write_all(&self.buffer).await?;
        self.buffer.clear();
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
