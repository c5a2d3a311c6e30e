//! Buffered, socket-backed byte streams.
//!
//! Each direction of an exchange owns one fixed-capacity buffer, which bounds the memory
//! a connection can hold while keeping the number of socket calls low:
//!
//! - [`ReadChannel`]: unread bytes from the peer, refilled with timeout-bounded reads
//! - [`WriteChannel`]: outgoing bytes accumulated until flushed or about to overflow

mod read_channel;
mod write_channel;

pub use read_channel::ReadChannel;
pub use write_channel::WriteChannel;

/// Default capacity of each channel direction
pub const DEFAULT_BUFFER_SIZE: usize = 4 * 1024;
