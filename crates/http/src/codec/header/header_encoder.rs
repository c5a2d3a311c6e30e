//! HTTP header encoder implementation for serializing HTTP response heads
//!
//! This module renders the pieces of a response head: the status line, single
//! `Name: Value` fields and the blank line that closes the header section. The output
//! engine feeds each piece to its channel as soon as it is written, so the head is
//! never materialized as a whole.

use crate::protocol::SendError;

use bytes::{BufMut, BytesMut};

use http::StatusCode;
use std::io;
use std::io::Write;
use tokio_util::codec::Encoder;

/// Reason phrase used when a status code has no canonical one
const UNKNOWN_REASON: &str = "Unknown";

/// One piece of a response head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadItem<'a> {
    /// `HTTP/1.1 <code> <reason>\r\n`
    StatusLine(StatusCode),
    /// `<name>: <value>\r\n`
    Field { name: &'a str, value: &'a str },
    /// The blank line terminating the header section
    End,
}

/// Encoder for response head items implementing the [`Encoder`] trait.
#[derive(Debug, Default)]
pub struct HeaderEncoder;

impl<'a> Encoder<HeadItem<'a>> for HeaderEncoder {
    type Error = SendError;

    /// Encodes one head item into the provided bytes buffer.
    ///
    /// # Errors
    ///
    /// Returns `SendError::BadResponse` for a field whose name is empty or contains a
    /// space, or whose name or value contains CR or LF. Nothing is written in that case.
    fn encode(&mut self, item: HeadItem<'a>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            HeadItem::StatusLine(status) => {
                write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", status.as_str(), reason_phrase(status))?;
            }
            HeadItem::Field { name, value } => {
                validate_field(name, value)?;
                dst.reserve(name.len() + value.len() + 4);
                dst.put_slice(name.as_bytes());
                dst.put_slice(b": ");
                dst.put_slice(value.as_bytes());
                dst.put_slice(b"\r\n");
            }
            HeadItem::End => dst.put_slice(b"\r\n"),
        }
        Ok(())
    }
}

/// The status-reason lookup: canonical reason phrase, or `"Unknown"`.
pub fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or(UNKNOWN_REASON)
}

fn validate_field(name: &str, value: &str) -> Result<(), SendError> {
    if name.is_empty() {
        return Err(SendError::bad_response("empty header field name"));
    }

    if name.bytes().any(|b| matches!(b, b' ' | b'\r' | b'\n')) {
        return Err(SendError::bad_response(format!("invalid header field name {name:?}")));
    }

    if value.bytes().any(|b| matches!(b, b'\r' | b'\n')) {
        return Err(SendError::bad_response(format!("invalid value for header field {name}")));
    }

    Ok(())
}

/// Fast writer implementation for writing to BytesMut.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
