use bytes::BytesMut;
use http::StatusCode;
use tokio::io::AsyncWrite;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::channel::WriteChannel;
use crate::codec::{HeadItem, HeaderEncoder};
use crate::ensure;
use crate::protocol::{SendError, State};

/// The outbound side of one exchange.
///
/// The status line is written lazily by the first header field or body write, so
/// [`set_status`](Self::set_status) may be called any time before that. Everything goes
/// through the write channel, which coalesces the small pieces of the head into few
/// socket writes.
///
/// States move `Idle` → `Header` (status line written) → `Body` (header section closed).
#[derive(Debug)]
pub struct OutputMessage<W> {
    state: State,
    status: StatusCode,
    channel: WriteChannel<W>,
    encoder: HeaderEncoder,
    head: BytesMut,
}

impl<W> OutputMessage<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, crate::channel::DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(writer: W, buffer_size: usize) -> Self {
        Self {
            state: State::Idle,
            status: StatusCode::OK,
            channel: WriteChannel::with_capacity(writer, buffer_size),
            encoder: HeaderEncoder,
            head: BytesMut::with_capacity(256),
        }
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Sets the response status, 200 unless changed.
    ///
    /// # Errors
    ///
    /// `BadResponse` once the status line has been written.
    pub fn set_status(&mut self, status: StatusCode) -> Result<(), SendError> {
        ensure!(self.state == State::Idle, SendError::bad_response("status line already written"));
        self.status = status;
        Ok(())
    }

    /// Writes one `name: value` header field, preceded by the status line if needed.
    ///
    /// # Errors
    ///
    /// `BadResponse` after the body has started or for an invalid field. Nothing is
    /// written in either case.
    pub async fn write_header_field(&mut self, name: &str, value: &str) -> Result<(), SendError> {
        ensure!(self.state != State::Body, SendError::bad_response(format!("header field {name} written after the body")));

        self.head.clear();
        if self.state == State::Idle {
            self.encoder.encode(HeadItem::StatusLine(self.status), &mut self.head)?;
        }
        self.encoder.encode(HeadItem::Field { name, value }, &mut self.head)?;

        self.state = State::Header;
        self.channel.send(&self.head).await
    }

    /// Writes body bytes, closing the header section first if it is still open.
    pub async fn write_data(&mut self, data: &[u8]) -> Result<(), SendError> {
        if self.state != State::Body {
            self.head.clear();
            if self.state == State::Idle {
                self.encoder.encode(HeadItem::StatusLine(self.status), &mut self.head)?;
            }
            self.encoder.encode(HeadItem::End, &mut self.head)?;

            self.state = State::Body;
            self.channel.send(&self.head).await?;
        }

        self.channel.send(data).await
    }

    pub async fn write_string(&mut self, text: &str) -> Result<(), SendError> {
        self.write_data(text.as_bytes()).await
    }

    /// Sends everything written so far.
    ///
    /// A message that never reached the body still gets its status line and the blank
    /// line closing the header section.
    pub async fn flush(&mut self) -> Result<(), SendError> {
        if self.state != State::Body {
            trace!(status = %self.status, "closing header section on flush");
            self.write_data(&[]).await?;
        }

        self.channel.flush().await
    }

    pub(crate) async fn shutdown(&mut self) -> Result<(), SendError> {
        self.channel.shutdown().await
    }

    pub fn get_ref(&self) -> &W {
        self.channel.get_ref()
    }
}
