use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncRead;
use tokio_util::codec::Decoder;
use tracing::{debug, trace, warn};

use crate::channel::ReadChannel;
use crate::codec::{DecodedHeader, HeaderDecoder};
use crate::ensure;
use crate::protocol::{BodyProgress, Event, PayloadSize, ReceiveError, RequestHeader, State};

/// The inbound side of one exchange.
///
/// The handler drives it with [`wait_event`](Self::wait_event) and takes the announced bytes
/// with [`read_data`](Self::read_data) or [`read_string`](Self::read_string).
///
/// # State Machine
///
/// - `Idle`: the header block is accumulated until its blank line arrives
/// - `Header`: the header has been parsed; body bytes may already be buffered
/// - `Body`: body chunks are announced until `Content-Length` bytes have been delivered
/// - `Complete`: terminal, every further wait reports [`Event::Complete`]
///
/// Content length is the only framing. Bytes beyond it are dropped, never delivered.
#[derive(Debug)]
pub struct InputMessage<R> {
    state: State,
    channel: ReadChannel<R>,
    decoder: HeaderDecoder,
    header: Option<RequestHeader>,
    header_text: Option<Bytes>,
    payload_size: PayloadSize,
    body: BodyProgress,
    /// The pending channel bytes were announced by a body event
    announced: bool,
    read_timeout: Duration,
}

impl<R> InputMessage<R>
where
    R: AsyncRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, crate::channel::DEFAULT_BUFFER_SIZE, super::DEFAULT_READ_TIMEOUT)
    }

    /// Creates an input message whose header block may not exceed `buffer_size` bytes and
    /// whose every read waits at most `read_timeout`.
    pub fn with_config(reader: R, buffer_size: usize, read_timeout: Duration) -> Self {
        Self {
            state: State::Idle,
            channel: ReadChannel::with_capacity(reader, buffer_size),
            decoder: HeaderDecoder::new(),
            header: None,
            header_text: None,
            payload_size: PayloadSize::Empty,
            body: BodyProgress::default(),
            announced: false,
            read_timeout,
        }
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// The parsed header, available once the header event has been delivered.
    pub fn header(&self) -> Option<&RequestHeader> {
        self.header.as_ref()
    }

    /// The declared body length; `None` before the header or for chunked bodies.
    pub fn content_length(&self) -> Option<u64> {
        self.header.as_ref().and_then(|_| self.payload_size.content_length())
    }

    pub fn progress(&self) -> BodyProgress {
        self.body
    }

    /// Waits for the next protocol event.
    ///
    /// The first call reads the header block and returns [`Event::Header`]. Later calls
    /// return [`Event::Body`] for each chunk of body bytes and finally [`Event::Complete`].
    /// Body bytes announced by an earlier event and never read are discarded.
    ///
    /// # Errors
    ///
    /// - `Timeout`, `NoData`: nothing arrived; waiting again is allowed
    /// - `Closed`: the peer closed the connection; the message is complete
    /// - `TooLong`: the header block does not fit the buffer
    /// - `Header`: the header block is malformed
    /// - `ChunkedBody`: the request uses chunked transfer encoding
    pub async fn wait_event(&mut self) -> Result<Event, ReceiveError> {
        match self.state {
            State::Idle => {
                let size = match self.receive_header().await {
                    Ok(size) => size,
                    Err(e) => {
                        if !e.is_retryable() {
                            self.finish();
                        }
                        return Err(e);
                    }
                };
                self.state = State::Header;
                Ok(Event::Header { size })
            }
            State::Header | State::Body => self.receive_body().await,
            State::Complete => Ok(Event::Complete),
        }
    }

    /// Takes the bytes announced by the last event.
    ///
    /// In the `Header` state this is the raw header block; in the `Body` state the body
    /// chunk. The data can be taken once; a second call returns `NoData`.
    pub fn read_data(&mut self) -> Result<Bytes, ReceiveError> {
        match self.state {
            State::Header => self.header_text.take().ok_or(ReceiveError::NoData),
            State::Body if self.announced => {
                self.announced = false;
                let data = self.channel.take_all();
                ensure!(!data.is_empty(), ReceiveError::NoData);
                Ok(data)
            }
            _ => Err(ReceiveError::NoData),
        }
    }

    /// Takes the bytes announced by the last event as text.
    ///
    /// The bytes are consumed even when they are not valid UTF-8.
    pub fn read_string(&mut self) -> Result<String, ReceiveError> {
        let data = self.read_data()?;
        Ok(std::str::from_utf8(&data)?.to_owned())
    }

    async fn receive_header(&mut self) -> Result<usize, ReceiveError> {
        loop {
            if let Some(decoded) = self.decoder.decode(self.channel.buffer_mut())? {
                let DecodedHeader { raw, header, payload_size } = decoded;
                debug!(
                    method = %header.method(),
                    uri = %header.uri(),
                    payload_size = ?payload_size,
                    buffered_body = self.channel.pending(),
                    "received request header"
                );

                self.body = BodyProgress::new(payload_size.content_length().unwrap_or(0));
                self.payload_size = payload_size;
                self.header = Some(header);
                let size = raw.len();
                self.header_text = Some(raw);
                return Ok(size);
            }

            if self.channel.is_full() {
                warn!(max_size = self.channel.capacity(), "request header block exceeds the buffer");
                return Err(ReceiveError::too_long(self.channel.capacity()));
            }

            self.channel.fill(self.read_timeout).await?;
        }
    }

    async fn receive_body(&mut self) -> Result<Event, ReceiveError> {
        ensure!(!self.payload_size.is_chunked(), ReceiveError::ChunkedBody);

        if self.body.is_finished() {
            self.finish();
            return Ok(Event::Complete);
        }

        if self.announced {
            trace!(bytes = self.channel.pending(), "discarding unread body bytes");
            self.channel.discard();
            self.announced = false;
        }

        if let Err(e) = self.channel.receive(self.read_timeout).await {
            if !e.is_retryable() {
                self.finish();
            }
            return Err(e);
        }

        let allowance = usize::try_from(self.body.remaining()).unwrap_or(usize::MAX);
        if self.channel.pending() > allowance {
            debug!(dropped = self.channel.pending() - allowance, "dropping bytes beyond content length");
            self.channel.clip(allowance);
        }

        let size = self.channel.pending();
        if size == 0 {
            self.finish();
            return Err(ReceiveError::NoData);
        }

        self.state = State::Body;
        self.body.received += size as u64;
        self.announced = true;
        Ok(Event::Body { size })
    }

    fn finish(&mut self) {
        self.state = State::Complete;
        self.announced = false;
        self.channel.discard();
    }

    pub fn get_ref(&self) -> &R {
        self.channel.get_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_io::{AfterScript, ScriptedReader};
    use http::Method;
    use indoc::indoc;

    const TIMEOUT: Duration = Duration::from_millis(50);

    fn request(text: &str) -> Vec<u8> {
        text.replace('\n', "\r\n").into_bytes()
    }

    fn post(body: &str, content_length: usize) -> Vec<u8> {
        let mut bytes = request(&format!("POST /echo HTTP/1.1\nHost: localhost\nContent-Length: {content_length}\n\n"));
        bytes.extend_from_slice(body.as_bytes());
        bytes
    }

    fn input(reader: ScriptedReader) -> InputMessage<ScriptedReader> {
        InputMessage::with_config(reader, 256, TIMEOUT)
    }

    /// Drives a message to completion, returning the event kinds and the body collected.
    async fn drain(message: &mut InputMessage<ScriptedReader>) -> (Vec<Event>, Vec<u8>) {
        let mut events = Vec::new();
        let mut body = Vec::new();
        loop {
            let event = message.wait_event().await.unwrap();
            events.push(event);
            match event {
                Event::Header { .. } => {
                    message.read_data().unwrap();
                }
                Event::Body { .. } => body.extend_from_slice(&message.read_data().unwrap()),
                Event::Complete => return (events, body),
            }
        }
    }

    #[tokio::test]
    async fn header_then_body_then_complete() {
        let bytes = post("hello", 5);
        let mut message = input(ScriptedReader::whole(&bytes, AfterScript::Pending));

        let event = message.wait_event().await.unwrap();
        assert_eq!(event, Event::Header { size: bytes.len() - 5 });
        assert_eq!(message.state(), State::Header);

        let header = message.header().unwrap();
        assert_eq!(header.method(), &Method::POST);
        assert_eq!(header.field("host"), Some("localhost"));
        assert_eq!(message.content_length(), Some(5));

        let text = message.read_string().unwrap();
        assert!(text.starts_with("POST /echo HTTP/1.1\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
        assert!(matches!(message.read_data(), Err(ReceiveError::NoData)));

        assert_eq!(message.wait_event().await.unwrap(), Event::Body { size: 5 });
        assert_eq!(message.read_string().unwrap(), "hello");
        assert!(matches!(message.read_data(), Err(ReceiveError::NoData)));

        assert_eq!(message.wait_event().await.unwrap(), Event::Complete);
        assert_eq!(message.wait_event().await.unwrap(), Event::Complete);
        assert_eq!(message.progress(), BodyProgress { expected: 5, received: 5 });
    }

    #[tokio::test]
    async fn one_byte_reads_deliver_the_same_message() {
        let bytes = post("some body text", 14);

        let mut whole = input(ScriptedReader::whole(&bytes, AfterScript::Pending));
        let (whole_events, whole_body) = drain(&mut whole).await;

        let mut split = input(ScriptedReader::split(&bytes, 1, AfterScript::Pending));
        let (split_events, split_body) = drain(&mut split).await;

        assert_eq!(whole_body, b"some body text");
        assert_eq!(split_body, whole_body);
        assert_eq!(split_events.first(), whole_events.first());
        assert_eq!(split_events.last(), Some(&Event::Complete));
        assert!(split_events[1..split_events.len() - 1].iter().all(Event::is_body));
        assert_eq!(split_events.iter().map(Event::size).sum::<usize>(), whole_events.iter().map(Event::size).sum::<usize>());
    }

    #[tokio::test]
    async fn arbitrary_chunking_keeps_events_consistent() {
        let bytes = post("0123456789abcdefghij", 20);
        for chunk in [2, 3, 7, 11, 64] {
            let mut message = input(ScriptedReader::split(&bytes, chunk, AfterScript::Pending));
            let (events, body) = drain(&mut message).await;

            assert!(events[0].is_header(), "chunk size {chunk}");
            assert_eq!(body, b"0123456789abcdefghij", "chunk size {chunk}");
            assert_eq!(events.last(), Some(&Event::Complete));
        }
    }

    #[tokio::test]
    async fn extra_bytes_beyond_content_length_are_dropped() {
        let bytes = post("helloEXTRA-BYTES", 5);
        let mut message = input(ScriptedReader::whole(&bytes, AfterScript::Pending));

        let (events, body) = drain(&mut message).await;

        assert_eq!(body, b"hello");
        let body_total: usize = events.iter().filter(|e| e.is_body()).map(Event::size).sum();
        assert_eq!(body_total, 5);
    }

    #[tokio::test]
    async fn extra_bytes_in_later_read_are_dropped() {
        let mut bytes = post("abc", 6);
        bytes.extend_from_slice(b"defghi");
        let header_len = bytes.len() - 9;
        let chunks = [&bytes[..header_len + 3], &bytes[header_len + 3..]];
        let mut message = input(ScriptedReader::new(chunks, AfterScript::Pending));

        let (events, body) = drain(&mut message).await;

        assert_eq!(body, b"abcdef");
        assert_eq!(events, vec![Event::Header { size: header_len }, Event::Body { size: 3 }, Event::Body { size: 3 }, Event::Complete]);
    }

    #[tokio::test]
    async fn zero_content_length_completes_immediately() {
        let bytes = request("GET / HTTP/1.1\nHost: localhost\n\n");
        let mut message = input(ScriptedReader::whole(&bytes, AfterScript::Pending));

        assert!(message.wait_event().await.unwrap().is_header());
        assert_eq!(message.content_length(), Some(0));
        assert_eq!(message.wait_event().await.unwrap(), Event::Complete);
        assert_eq!(message.state(), State::Complete);
        // no socket read after the header
        assert_eq!(message.get_ref().reads(), 1);
    }

    #[tokio::test]
    async fn header_larger_than_buffer_is_too_long() {
        let text = indoc! {"
            GET / HTTP/1.1
            Host: localhost
            X-Padding: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa
        "};
        let bytes = request(text);
        let mut message = InputMessage::with_config(ScriptedReader::split(&bytes, 10, AfterScript::Pending), 32, TIMEOUT);

        let result = message.wait_event().await;

        assert!(matches!(result, Err(ReceiveError::TooLong { max_size: 32 })));
        assert!(message.header().is_none());
        assert_eq!(message.wait_event().await.unwrap(), Event::Complete);
    }

    #[tokio::test]
    async fn header_filling_the_buffer_exactly_is_accepted() {
        let bytes = request("GET / HTTP/1.1\nHost: localhost\n\n");
        let mut message = InputMessage::with_config(ScriptedReader::split(&bytes, 5, AfterScript::Pending), bytes.len(), TIMEOUT);

        assert_eq!(message.wait_event().await.unwrap(), Event::Header { size: bytes.len() });
    }

    #[tokio::test]
    async fn header_timeout_is_retryable() {
        let bytes = request("GET / HTTP/1.1\nHost: loc");
        let mut message = input(ScriptedReader::whole(&bytes, AfterScript::Pending));

        let result = message.wait_event().await;

        assert!(matches!(result, Err(ReceiveError::Timeout { .. })));
        assert_eq!(message.state(), State::Idle);
    }

    #[tokio::test]
    async fn malformed_header_fails_the_exchange() {
        let bytes = request("BROKEN\n\n");
        let mut message = input(ScriptedReader::whole(&bytes, AfterScript::Pending));

        assert!(matches!(message.wait_event().await, Err(ReceiveError::Header { .. })));
        assert_eq!(message.state(), State::Complete);
    }

    #[tokio::test]
    async fn body_arrives_in_a_later_read() {
        let bytes = post("", 4);
        let mut message = input(ScriptedReader::new([&bytes[..], &b"data"[..]], AfterScript::Pending));

        assert!(message.wait_event().await.unwrap().is_header());
        assert_eq!(message.wait_event().await.unwrap(), Event::Body { size: 4 });
        assert_eq!(message.read_string().unwrap(), "data");
        assert_eq!(message.wait_event().await.unwrap(), Event::Complete);
    }

    #[tokio::test]
    async fn short_body_ends_when_peer_closes() {
        let bytes = post("abc", 10);
        let mut message = input(ScriptedReader::whole(&bytes, AfterScript::Eof));

        assert!(message.wait_event().await.unwrap().is_header());
        assert_eq!(message.wait_event().await.unwrap(), Event::Body { size: 3 });
        message.read_data().unwrap();

        let result = message.wait_event().await;
        assert!(matches!(result, Err(ReceiveError::Closed)));
        assert!(!result.unwrap_err().is_retryable());
        assert_eq!(message.state(), State::Complete);
        assert_eq!(message.wait_event().await.unwrap(), Event::Complete);
        assert_eq!(message.progress(), BodyProgress { expected: 10, received: 3 });
    }

    #[tokio::test]
    async fn partial_header_ends_when_peer_closes() {
        let mut message = InputMessage::with_config(
            ScriptedReader::whole(b"GET / HTTP/1.1\r\nHost: a", AfterScript::Eof),
            256,
            Duration::from_secs(10),
        );

        assert!(matches!(message.wait_event().await, Err(ReceiveError::Closed)));
        assert_eq!(message.state(), State::Complete);
        assert!(message.header().is_none());

        // later waits return at once instead of reporting a retryable outcome
        for _ in 0..3 {
            assert_eq!(message.wait_event().await.unwrap(), Event::Complete);
        }
        assert_eq!(message.get_ref().reads(), 1);
    }

    #[tokio::test]
    async fn unread_body_is_discarded_not_recounted() {
        let bytes = post("abcd", 8);
        let mut message = input(ScriptedReader::new([&bytes[..], &b"efgh"[..]], AfterScript::Pending));

        assert!(message.wait_event().await.unwrap().is_header());
        assert_eq!(message.wait_event().await.unwrap(), Event::Body { size: 4 });
        // skip reading "abcd"
        assert_eq!(message.wait_event().await.unwrap(), Event::Body { size: 4 });
        assert_eq!(message.read_string().unwrap(), "efgh");
        assert_eq!(message.progress().received, 8);
        assert_eq!(message.wait_event().await.unwrap(), Event::Complete);
    }

    #[tokio::test]
    async fn chunked_body_is_rejected_after_header() {
        let bytes = request("POST / HTTP/1.1\nTransfer-Encoding: chunked\n\n5\nhello\n0\n\n");
        let mut message = input(ScriptedReader::whole(&bytes, AfterScript::Pending));

        assert!(message.wait_event().await.unwrap().is_header());
        assert_eq!(message.content_length(), None);
        assert!(matches!(message.wait_event().await, Err(ReceiveError::ChunkedBody)));
    }

    #[tokio::test]
    async fn invalid_utf8_body() {
        let mut bytes = post("", 2);
        bytes.extend_from_slice(&[0xff, 0xfe]);
        let mut message = input(ScriptedReader::whole(&bytes, AfterScript::Pending));

        message.wait_event().await.unwrap();
        message.read_data().unwrap();
        assert_eq!(message.wait_event().await.unwrap(), Event::Body { size: 2 });
        assert!(matches!(message.read_string(), Err(ReceiveError::InvalidText { .. })));
    }
}
