use std::io;
use std::str::Utf8Error;
use std::time::Duration;
use thiserror::Error;

/// Failures of the header collaborator while turning a raw header block into a [`RequestHeader`].
///
/// [`RequestHeader`]: crate::protocol::RequestHeader
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Outcomes of the input side other than a delivered event.
///
/// `Timeout` and `NoData` are expected, recoverable outcomes: the caller decides whether
/// to wait again. Everything else ends the exchange.
#[derive(Error, Debug)]
pub enum ReceiveError {
    #[error("no data arrived within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("no data available")]
    NoData,

    #[error("connection closed by peer")]
    Closed,

    #[error("header block exceeds the buffer capacity of {max_size} bytes")]
    TooLong { max_size: usize },

    #[error("invalid request header: {source}")]
    Header {
        #[from]
        source: ParseError,
    },

    #[error("chunked transfer encoding is not supported")]
    ChunkedBody,

    #[error("received data is not valid utf-8: {source}")]
    InvalidText {
        #[from]
        source: Utf8Error,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ReceiveError {
    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    pub fn too_long(max_size: usize) -> Self {
        Self::TooLong { max_size }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true for outcomes the caller may simply wait on again.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReceiveError::Timeout { .. } | ReceiveError::NoData)
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("bad response: {reason}")]
    BadResponse { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn bad_response<S: ToString>(str: S) -> Self {
        Self::BadResponse { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("server is not listening")]
    NotListening,

    #[error("server is already listening")]
    AlreadyListening,

    #[error("can't resolve an ipv4 address for host {host}")]
    InvalidAddress { host: String },

    #[error("no connection arrived within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("no client is waiting to be accepted")]
    NoClient,

    #[error("socket error: {source}")]
    Socket {
        #[from]
        source: io::Error,
    },
}

impl ServerError {
    pub fn invalid_address<S: ToString>(host: S) -> Self {
        Self::InvalidAddress { host: host.to_string() }
    }

    pub fn socket<E: Into<io::Error>>(e: E) -> Self {
        Self::Socket { source: e.into() }
    }

    /// Returns true for accept outcomes that only mean "nothing happened yet".
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServerError::Timeout { .. } | ServerError::NoClient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_outcomes() {
        assert!(ReceiveError::timeout(Duration::from_millis(10)).is_retryable());
        assert!(ReceiveError::NoData.is_retryable());
        assert!(!ReceiveError::Closed.is_retryable());
        assert!(!ReceiveError::too_long(4096).is_retryable());
        assert!(!ReceiveError::ChunkedBody.is_retryable());

        assert!(ServerError::NoClient.is_retryable());
        assert!(ServerError::Timeout { timeout: Duration::from_secs(1) }.is_retryable());
        assert!(!ServerError::NotListening.is_retryable());
    }
}
