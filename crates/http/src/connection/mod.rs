//! One request/response exchange over a connection.
//!
//! An accepted stream is split into its read and write halves, each wrapped by one side
//! of the exchange:
//!
//! - [`InputMessage`]: turns the inbound bytes into [`Event`](crate::protocol::Event)s
//!   (header, body chunks, completion) bounded by the declared content length
//! - [`OutputMessage`]: writes the status line, header fields and body through a
//!   coalescing buffer
//!
//! Both sides are driven by the handler; the server only flushes and closes them once
//! the handler returns.

mod input;
mod output;

use std::time::Duration;

pub use input::InputMessage;
pub use output::OutputMessage;

/// Default bound on every read of the input side
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
