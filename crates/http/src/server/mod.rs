//! Connection acceptance and the server lifecycle.
//!
//! A [`Server`] owns the listening socket and a [`SlotTable`] with one slot per
//! concurrently served connection. Each accepted connection claims a slot and is served
//! by its own task, which runs the [`Handler`](crate::handler::Handler) and frees the slot
//! when the exchange ends. [`Server::stop`] closes the listening socket and waits for
//! every such task.

mod config;
#[allow(clippy::module_inception, reason = "the module is named after the type it holds")]
mod server;
mod slot_table;

pub use config::{DEFAULT_ACCEPT_TIMEOUT, DEFAULT_MAX_CLIENTS, MAX_CONNECTIONS, ServerConfig};
pub use server::{Accepted, Server};
pub use slot_table::{SlotId, SlotTable};
