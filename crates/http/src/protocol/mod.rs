//! Core HTTP protocol abstractions.
//!
//! This module holds the data model shared by the input and output engines:
//! message states, the events announced while reading a request, content-length
//! accounting, the parsed request header and the error types of every layer.
//!
//! # Architecture
//!
//! - **Message Model** (`message`): progress of one side of an exchange
//!   - [`State`]: `Idle`, `Header`, `Body`, `Complete`
//!   - [`Event`]: header or body data became available, or the message is complete
//!   - [`PayloadSize`]: the content length derived from the header block
//!   - [`BodyProgress`]: expected vs. received body bytes
//!
//! - **Request Header** (`request`): [`RequestHeader`] wraps `http::Request<()>`
//!
//! - **Error Handling** (`error`):
//!   - [`ParseError`]: header block parsing errors
//!   - [`ReceiveError`]: input side outcomes
//!   - [`SendError`]: output side errors
//!   - [`ServerError`]: listening socket and accept errors

mod message;
pub use message::BodyProgress;
pub use message::Event;
pub use message::PayloadSize;
pub use message::State;

mod request;
pub use request::RequestHeader;

mod error;
pub use error::ParseError;
pub use error::ReceiveError;
pub use error::SendError;
pub use error::ServerError;
