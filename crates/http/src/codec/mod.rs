//! HTTP codec module for encoding and decoding message heads
//!
//! The engine frames bodies by content length only, so the codec is limited to the
//! head of each message:
//!
//! - Request side: [`HeaderDecoder`] turns the header block into a [`RequestHeader`]
//!   plus the declared [`PayloadSize`]
//! - Response side: [`HeaderEncoder`] renders the status line, fields and the
//!   terminating blank line as [`HeadItem`]s
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use http::StatusCode;
//! use tokio_util::codec::{Decoder, Encoder};
//! use webster::codec::{HeadItem, HeaderDecoder, HeaderEncoder};
//!
//! let mut request = BytesMut::from("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! let decoded = HeaderDecoder::new().decode(&mut request).unwrap().unwrap();
//! assert_eq!(decoded.header.field("host"), Some("localhost"));
//!
//! let mut response = BytesMut::new();
//! HeaderEncoder.encode(HeadItem::StatusLine(StatusCode::OK), &mut response).unwrap();
//! assert_eq!(&response[..], b"HTTP/1.1 200 OK\r\n");
//! ```
//!
//! [`RequestHeader`]: crate::protocol::RequestHeader
//! [`PayloadSize`]: crate::protocol::PayloadSize

mod header;

pub use header::DecodedHeader;
pub use header::HeadItem;
pub use header::HeaderDecoder;
pub use header::HeaderEncoder;
pub use header::parse_header;
pub use header::reason_phrase;
