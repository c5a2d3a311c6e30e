use std::time::Duration;

use crate::channel::DEFAULT_BUFFER_SIZE;
use crate::connection::DEFAULT_READ_TIMEOUT;

/// Hard upper bound on concurrently served connections
pub const MAX_CONNECTIONS: usize = 1000;

pub const DEFAULT_MAX_CLIENTS: usize = 10;

/// Default bound on one wait for an incoming connection
pub const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Settings of a [`Server`](super::Server).
///
/// ```
/// use std::time::Duration;
/// use webster::server::ServerConfig;
///
/// let config = ServerConfig::default().with_max_clients(64).with_read_timeout(Duration::from_secs(2));
/// assert_eq!(config.max_clients(), 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    max_clients: usize,
    buffer_size: usize,
    read_timeout: Duration,
    accept_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_clients: DEFAULT_MAX_CLIENTS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of connection slots, also used as the listen backlog.
    ///
    /// `0` and values of at least [`MAX_CONNECTIONS`] select [`MAX_CONNECTIONS`].
    #[must_use]
    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = if max_clients == 0 || max_clients >= MAX_CONNECTIONS { MAX_CONNECTIONS } else { max_clients };
        self
    }

    /// Sets the capacity of each direction's buffer, which is also the largest
    /// accepted request header block.
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    #[must_use]
    pub fn with_accept_timeout(mut self, accept_timeout: Duration) -> Self {
        self.accept_timeout = accept_timeout;
        self
    }

    #[inline]
    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    #[inline]
    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    #[inline]
    pub fn accept_timeout(&self) -> Duration {
        self.accept_timeout
    }
}
