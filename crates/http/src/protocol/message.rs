/// Progress of one side of an exchange.
///
/// Both directions share this type. The input side walks `Idle -> Header -> Body -> Complete`;
/// the output side stops at `Body`, which closes the header section for good.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum State {
    /// Nothing has been received or written yet
    #[default]
    Idle,
    /// The header block has been received, or the status line has been written
    Header,
    /// Body bytes are flowing
    Body,
    /// No more data will ever be delivered
    Complete,
}

/// Notification returned by [`InputMessage::wait_event`].
///
/// An event owns no data. It only announces that `size` bytes are ready to be taken with
/// [`InputMessage::read_data`] or [`InputMessage::read_string`].
///
/// [`InputMessage::wait_event`]: crate::connection::InputMessage::wait_event
/// [`InputMessage::read_data`]: crate::connection::InputMessage::read_data
/// [`InputMessage::read_string`]: crate::connection::InputMessage::read_string
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    /// The header block is complete; `size` is its length including the blank line
    Header { size: usize },
    /// `size` body bytes are buffered
    Body { size: usize },
    /// The message is fully delivered
    Complete,
}

impl Event {
    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, Event::Header { .. })
    }

    #[inline]
    pub fn is_body(&self) -> bool {
        matches!(self, Event::Body { .. })
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, Event::Complete)
    }

    /// Number of bytes announced, zero for `Complete`.
    pub fn size(&self) -> usize {
        match self {
            Event::Header { size } | Event::Body { size } => *size,
            Event::Complete => 0,
        }
    }
}

/// Represents the size information of an HTTP payload.
///
/// This enum is produced by the header decoder:
/// - Known length: exactly that many body bytes follow the header
/// - Chunked: the sentinel for `Transfer-Encoding: chunked`, which the engine rejects
/// - Empty: no payload to process
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload using chunked transfer encoding
    Chunked,
    /// Empty payload (no body)
    Empty,
}

impl PayloadSize {
    /// Returns true if the payload uses chunked transfer encoding
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, PayloadSize::Chunked)
    }

    /// Returns true if the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, PayloadSize::Empty | PayloadSize::Length(0))
    }

    /// The declared number of body bytes, `None` when unknown (chunked).
    pub fn content_length(&self) -> Option<u64> {
        match self {
            PayloadSize::Length(n) => Some(*n),
            PayloadSize::Empty => Some(0),
            PayloadSize::Chunked => None,
        }
    }
}

/// Content-length accounting of an input message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BodyProgress {
    /// Body bytes declared by the header
    pub expected: u64,
    /// Body bytes announced to the handler so far
    pub received: u64,
}

impl BodyProgress {
    pub fn new(expected: u64) -> Self {
        Self { expected, received: 0 }
    }

    /// Body bytes still allowed before the content length is reached.
    #[inline]
    pub fn remaining(&self) -> u64 {
        self.expected.saturating_sub(self.received)
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.received >= self.expected
    }
}
