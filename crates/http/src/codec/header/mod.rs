//! HTTP header processing module for encoding and decoding headers
//!
//! # Components
//!
//! - [`HeaderDecoder`]: Decodes a request header block from raw bytes
//!   - Scans for the blank line terminating the block
//!   - Parses the request line and fields with `httparse`
//!   - Derives the content length
//!
//! - [`HeaderEncoder`]: Encodes response head items to bytes
//!   - Status line with the canonical reason phrase
//!   - Single header fields, with minimal name/value validation
//!   - The blank line closing the header section

mod header_decoder;
mod header_encoder;

pub use header_decoder::DecodedHeader;
pub use header_decoder::HeaderDecoder;
pub use header_decoder::parse_header;
pub use header_encoder::HeadItem;
pub use header_encoder::HeaderEncoder;
pub use header_encoder::reason_phrase;
