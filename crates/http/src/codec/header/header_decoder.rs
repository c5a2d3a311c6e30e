//! HTTP header decoder implementation for parsing HTTP request headers
//!
//! This module turns the raw header block at the front of the input buffer into a
//! structured [`RequestHeader`] and the declared [`PayloadSize`].
//!
//! # Features
//!
//! - Delimiter scanning that resumes where the previous attempt stopped, so feeding the
//!   block one byte at a time costs no more than feeding it at once
//! - Zero-copy field values sliced out of the frozen header block
//! - Support for HTTP/1.0 and HTTP/1.1
//! - Content length derived from `Content-Length`, with `Transfer-Encoding: chunked`
//!   reported as [`PayloadSize::Chunked`]
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - The block size itself is bounded by the caller's buffer, see
//!   [`InputMessage`](crate::connection::InputMessage)

use bytes::{Bytes, BytesMut};
use http::{HeaderName, HeaderValue, Request};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;

use crate::protocol::{ParseError, PayloadSize, RequestHeader};

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// The blank line terminating a header block
const DELIMITER: &[u8] = b"\r\n\r\n";

/// A fully decoded header block.
#[derive(Debug)]
pub struct DecodedHeader {
    /// The raw block, request line through the terminating blank line
    pub raw: Bytes,
    pub header: RequestHeader,
    pub payload_size: PayloadSize,
}

/// Decoder for HTTP request headers implementing the [`Decoder`] trait.
///
/// On success the header block is split off the front of the source buffer, leaving any
/// body bytes that arrived in the same reads in place.
#[derive(Debug, Default)]
pub struct HeaderDecoder {
    /// Offset up to which the buffer is known not to contain the delimiter
    scanned: usize,
}

impl HeaderDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for HeaderDecoder {
    type Item = DecodedHeader;
    type Error = ParseError;

    /// Attempts to decode HTTP headers from the provided bytes buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(header))` if a complete header block was parsed and removed from `src`
    /// - `Ok(None)` if the blank line has not arrived yet
    /// - `Err(ParseError)` if the block is malformed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(end) = self.find_delimiter(src) else {
            return Ok(None);
        };
        self.scanned = 0;

        trace!(header_size = end, "found header delimiter");
        let raw = src.split_to(end).freeze();
        let (header, payload_size) = parse_header(&raw)?;

        Ok(Some(DecodedHeader { raw, header, payload_size }))
    }
}

impl HeaderDecoder {
    /// Returns the length of the header block including the delimiter, if complete.
    fn find_delimiter(&mut self, src: &[u8]) -> Option<usize> {
        // the delimiter may straddle the previously scanned region
        let from = self.scanned.min(src.len()).saturating_sub(DELIMITER.len() - 1);
        match src[from..].windows(DELIMITER.len()).position(|w| w == DELIMITER) {
            Some(position) => Some(from + position + DELIMITER.len()),
            None => {
                self.scanned = src.len();
                None
            }
        }
    }
}

/// Parses a complete header block into the field mapping and the declared content length.
///
/// Field names are case-insensitive; when a field repeats, the last value wins.
pub fn parse_header(raw: &Bytes) -> Result<(RequestHeader, PayloadSize), ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut req = httparse::Request::new(&mut headers);

    let parsed_result = req.parse(raw).map_err(|e| match e {
        Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
        e => ParseError::invalid_header(e.to_string()),
    })?;
    ensure!(matches!(parsed_result, Status::Complete(_)), ParseError::invalid_header("incomplete header block"));

    let version = match req.version {
        Some(0) => http::Version::HTTP_10,
        Some(1) => http::Version::HTTP_11,
        // Currently HTTP/2 and HTTP/3 not supported
        _ => return Err(ParseError::InvalidVersion(req.version)),
    };

    let mut header_builder = Request::builder()
        .method(req.method.ok_or(ParseError::InvalidMethod)?)
        .uri(req.path.ok_or(ParseError::InvalidUri)?)
        .version(version);

    let headers = header_builder.headers_mut().ok_or_else(|| ParseError::invalid_header("invalid request line"))?;
    headers.reserve(req.headers.len());
    for field in req.headers.iter() {
        let name = HeaderName::from_bytes(field.name.as_bytes()).map_err(ParseError::invalid_header)?;
        let value = HeaderValue::from_maybe_shared(raw.slice_ref(field.value)).map_err(ParseError::invalid_header)?;
        headers.insert(name, value);
    }

    let header = RequestHeader::from(header_builder.body(()).map_err(|e| match e {
        e if e.is::<http::method::InvalidMethod>() => ParseError::InvalidMethod,
        e if e.is::<http::uri::InvalidUri>() => ParseError::InvalidUri,
        e => ParseError::invalid_header(e),
    })?);
    let payload_size = parse_payload(&header)?;

    Ok((header, payload_size))
}

/// Determines the payload size from the Content-Length and Transfer-Encoding headers.
///
/// Content length is the only framing this engine implements, and it applies to every
/// method. A missing Content-Length means an empty body.
fn parse_payload(header: &RequestHeader) -> Result<PayloadSize, ParseError> {
    // refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-transfer-encoding
    let te_header = header.headers().get(http::header::TRANSFER_ENCODING);
    let cl_header = header.headers().get(http::header::CONTENT_LENGTH);

    match (te_header, cl_header) {
        (None, None) => Ok(PayloadSize::Empty),

        (te_value @ Some(_), None) => {
            if is_chunked(te_value) {
                Ok(PayloadSize::Chunked)
            } else {
                Ok(PayloadSize::Empty)
            }
        }

        (None, Some(cl_value)) => {
            let cl_str = cl_value.to_str().map_err(|_| ParseError::invalid_content_length("value can't to_str"))?;

            let length =
                cl_str.trim().parse::<u64>().map_err(|_| ParseError::invalid_content_length(format!("value {cl_str} is not u64")))?;

            Ok(PayloadSize::Length(length))
        }

        (Some(_), Some(_)) => Err(ParseError::invalid_content_length("transfer_encoding and content_length both present in headers")),
    }
}

/// Checks if the Transfer-Encoding header indicates chunked encoding.
///
/// According to RFC 7230, chunked must be the last encoding if present.
fn is_chunked(header_value: Option<&HeaderValue>) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    if let Some(value) = header_value {
        if let Some(bytes) = value.as_bytes().rsplit(|b| *b == b',').next() {
            return bytes.trim_ascii() == CHUNKED;
        }
    }
    false
}
