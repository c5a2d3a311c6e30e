//! In-memory I/O used by the unit tests.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// What a [`ScriptedReader`] does once its chunks are exhausted.
#[derive(Debug, Clone, Copy)]
pub(crate) enum AfterScript {
    /// Report end of stream
    Eof,
    /// Never become readable again
    Pending,
}

/// Reader that hands out one scripted chunk per read call.
#[derive(Debug)]
pub(crate) struct ScriptedReader {
    chunks: VecDeque<Vec<u8>>,
    after: AfterScript,
    reads: usize,
}

impl ScriptedReader {
    pub(crate) fn new<I, C>(chunks: I, after: AfterScript) -> Self
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        Self { chunks: chunks.into_iter().map(|c| c.as_ref().to_vec()).collect(), after, reads: 0 }
    }

    /// The whole stream in a single chunk.
    pub(crate) fn whole(data: &[u8], after: AfterScript) -> Self {
        Self::new([data], after)
    }

    /// The stream split into chunks of `size` bytes.
    pub(crate) fn split(data: &[u8], size: usize, after: AfterScript) -> Self {
        Self::new(data.chunks(size), after)
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads
    }
}

impl AsyncRead for ScriptedReader {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let Some(mut chunk) = self.chunks.pop_front() else {
            return match self.after {
                AfterScript::Eof => Poll::Ready(Ok(())),
                AfterScript::Pending => Poll::Pending,
            };
        };

        self.reads += 1;
        let amt = std::cmp::min(chunk.len(), buf.remaining());
        buf.put_slice(&chunk[..amt]);
        if amt < chunk.len() {
            let rest = chunk.split_off(amt);
            self.chunks.push_front(rest);
        }
        Poll::Ready(Ok(()))
    }
}

/// Writer recording every write call separately, shareable so tests can inspect it
/// after the writer has been moved into a channel.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingWriter {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl RecordingWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of write calls that reached the writer.
    pub(crate) fn write_calls(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    /// Everything written so far, concatenated.
    pub(crate) fn written(&self) -> Vec<u8> {
        self.writes.lock().unwrap().concat()
    }
}

impl AsyncWrite for RecordingWriter {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        self.writes.lock().unwrap().push(buf.to_vec());
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}
