use std::io::ErrorKind;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::ensure;
use crate::protocol::ReceiveError;

/// The receiving half of a buffered channel.
///
/// Holds at most `capacity` unread bytes. Every socket read is bounded both by the
/// remaining room and by a caller supplied timeout.
#[derive(Debug)]
pub struct ReadChannel<R> {
    reader: R,
    buffer: BytesMut,
    capacity: usize,
}

impl<R> ReadChannel<R>
where
    R: AsyncRead + Unpin,
{
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self { reader, buffer: BytesMut::with_capacity(capacity), capacity }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of received bytes not yet consumed.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// The received bytes not yet consumed.
    #[inline]
    pub fn unread(&self) -> &[u8] {
        &self.buffer
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    /// Makes sure some unread data is buffered.
    ///
    /// Returns immediately when bytes are already pending; otherwise performs one read
    /// of at most `capacity` bytes, waiting no longer than `timeout`.
    ///
    /// # Errors
    ///
    /// - `Timeout` when nothing became readable in time
    /// - `Closed` when the peer closed the stream
    /// - `NoData` when the read would block
    /// - `Io` for any other transport failure
    pub async fn receive(&mut self, timeout: Duration) -> Result<(), ReceiveError> {
        if !self.buffer.is_empty() {
            return Ok(());
        }

        self.fill(timeout).await.map(|_| ())
    }

    /// Performs one read appending to the unread bytes, returning the number of bytes read.
    ///
    /// # Errors
    ///
    /// Same as [`receive`](Self::receive), plus `TooLong` when the buffer has no room left.
    pub async fn fill(&mut self, timeout: Duration) -> Result<usize, ReceiveError> {
        let room = self.capacity - self.buffer.len().min(self.capacity);
        ensure!(room > 0, ReceiveError::too_long(self.capacity));

        self.buffer.reserve(room);
        let mut limited = (&mut self.reader).take(room as u64);
        let read = limited.read_buf(&mut self.buffer);

        match tokio::time::timeout(timeout, read).await {
            Err(_) => Err(ReceiveError::timeout(timeout)),
            Ok(Ok(0)) => {
                trace!("read channel reached end of stream");
                Err(ReceiveError::Closed)
            }
            Ok(Ok(n)) => {
                trace!(bytes = n, pending = self.buffer.len(), "read channel received");
                Ok(n)
            }
            Ok(Err(e)) if e.kind() == ErrorKind::WouldBlock => Err(ReceiveError::NoData),
            Ok(Err(e)) => Err(ReceiveError::io(e)),
        }
    }

    /// Consumes up to `len` unread bytes from the front.
    pub fn take(&mut self, len: usize) -> Bytes {
        let len = len.min(self.buffer.len());
        self.buffer.split_to(len).freeze()
    }

    /// Consumes every unread byte.
    pub fn take_all(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    /// Drops unread bytes past the first `len`.
    pub fn clip(&mut self, len: usize) {
        self.buffer.truncate(len);
    }

    /// Drops every unread byte.
    pub fn discard(&mut self) {
        self.buffer.clear();
    }

    /// The unread bytes, for decoders that split data off the front.
    pub(crate) fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buffer
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_io::{AfterScript, ScriptedReader};

    const TIMEOUT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn receive_skips_socket_when_pending() {
        let reader = ScriptedReader::new(["abc", "def"], AfterScript::Eof);
        let mut channel = ReadChannel::with_capacity(reader, 16);

        channel.receive(TIMEOUT).await.unwrap();
        assert_eq!(channel.unread(), b"abc");

        channel.receive(TIMEOUT).await.unwrap();
        assert_eq!(channel.get_ref().reads(), 1);
        assert_eq!(channel.unread(), b"abc");

        assert_eq!(&channel.take_all()[..], b"abc");
        channel.receive(TIMEOUT).await.unwrap();
        assert_eq!(channel.unread(), b"def");
        assert_eq!(channel.get_ref().reads(), 2);
    }

    #[tokio::test]
    async fn reads_at_most_capacity() {
        let reader = ScriptedReader::whole(b"0123456789", AfterScript::Eof);
        let mut channel = ReadChannel::with_capacity(reader, 4);

        channel.receive(TIMEOUT).await.unwrap();
        assert_eq!(channel.unread(), b"0123");
        assert!(channel.is_full());
        assert!(matches!(channel.fill(TIMEOUT).await, Err(ReceiveError::TooLong { max_size: 4 })));

        channel.take(2);
        assert_eq!(channel.fill(TIMEOUT).await.unwrap(), 2);
        assert_eq!(channel.unread(), b"2345");
    }

    #[tokio::test]
    async fn timeout_when_nothing_arrives() {
        let reader = ScriptedReader::new(Vec::<Vec<u8>>::new(), AfterScript::Pending);
        let mut channel = ReadChannel::with_capacity(reader, 8);

        let result = channel.receive(TIMEOUT).await;
        assert!(matches!(result, Err(ReceiveError::Timeout { timeout }) if timeout == TIMEOUT));
    }

    #[tokio::test]
    async fn closed_at_end_of_stream() {
        let reader = ScriptedReader::new(Vec::<Vec<u8>>::new(), AfterScript::Eof);
        let mut channel = ReadChannel::with_capacity(reader, 8);

        let result = channel.receive(TIMEOUT).await;
        assert!(matches!(result, Err(ReceiveError::Closed)));
        assert!(!result.unwrap_err().is_retryable());
    }

    #[tokio::test]
    async fn clip_and_take() {
        let reader = ScriptedReader::whole(b"hello world", AfterScript::Eof);
        let mut channel = ReadChannel::with_capacity(reader, 32);

        channel.receive(TIMEOUT).await.unwrap();
        channel.clip(5);
        assert_eq!(channel.pending(), 5);
        assert_eq!(&channel.take(100)[..], b"hello");
        assert_eq!(channel.pending(), 0);
    }
}
