//! An embeddable HTTP/1.1 server engine with a streaming message API
//!
//! The server accepts connections on a listening socket and hands each one, as a pair of
//! messages, to an application handler. The handler reads the request as a sequence of
//! events and writes the response piece by piece; every connection serves exactly one
//! request/response exchange and is closed afterwards.
//!
//! # Features
//!
//! - Bounded concurrency: a fixed number of connection slots, excess connections are
//!   closed immediately instead of queued
//! - Event driven request reading that does not depend on how the transport splits bytes
//! - Content-length framing; bytes past the declared length are dropped
//! - Lazy status line and coalesced writes on the response side
//! - Every wait is bounded by a timeout the caller may retry on
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use futures::FutureExt;
//! use futures::future::BoxFuture;
//! use http::StatusCode;
//! use tracing::{error, info};
//! use webster::handler::{make_handler, Input, Output};
//! use webster::protocol::Event;
//! use webster::server::Server;
//!
//! fn hello<'a>(input: &'a mut Input, output: &'a mut Output) -> BoxFuture<'a, ()> {
//!     async move {
//!         loop {
//!             match input.wait_event().await {
//!                 Ok(Event::Header { .. }) => {
//!                     let path = input.header().map(|h| h.uri().path().to_owned());
//!                     info!(path = ?path, "request received");
//!                 }
//!                 Ok(Event::Body { .. }) => {}
//!                 Ok(Event::Complete) => break,
//!                 Err(e) => {
//!                     error!(cause = %e, "can't read request");
//!                     let _ = output.set_status(StatusCode::BAD_REQUEST);
//!                     return;
//!                 }
//!             }
//!         }
//!
//!         let body = "Hello World!\r\n";
//!         let _ = output.write_header_field("Content-Length", &body.len().to_string()).await;
//!         let _ = output.write_string(body).await;
//!     }
//!     .boxed()
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut server = Server::new(64);
//!     if let Err(e) = server.start(None, 8080).await {
//!         error!(cause = %e, "can't start server");
//!         return;
//!     }
//!
//!     let handler = Arc::new(make_handler(hello));
//!     let shutdown = async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     };
//!     if let Err(e) = server.run(handler, shutdown).await {
//!         error!(cause = %e, "server stopped with error");
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: message states, events and error types
//! - [`codec`]: request header parsing and response head encoding
//! - [`channel`]: fixed-capacity buffered reader and writer
//! - [`connection`]: the input and output side of one exchange
//! - [`handler`]: the application boundary
//! - [`server`]: listening socket, connection slots and worker tasks
//!
//! # Limitations
//!
//! - HTTP/1.1 only, one exchange per connection (no keep-alive)
//! - No TLS
//! - Chunked request bodies are rejected
//! - The header block must fit in one buffer (4KB by default), with at most 64 fields

pub mod channel;
pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;

#[cfg(test)]
mod test_io;
