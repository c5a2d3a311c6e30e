//! HTTP request header handling implementation.
//!
//! This module provides the parsed form of a request's header block. It wraps the
//! standard `http::Request` type so handlers get typed access to the method, URI,
//! version and field mapping.

use http::request::Parts;
use http::{HeaderMap, Method, Request, Uri, Version};

/// Represents an HTTP request header.
///
/// This struct wraps a `http::Request<()>` to provide:
/// - Access to standard HTTP header fields
/// - Case-insensitive field lookup
/// - Request metadata inspection
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl AsRef<Request<()>> for RequestHeader {
    fn as_ref(&self) -> &Request<()> {
        &self.inner
    }
}

impl RequestHeader {
    /// Consumes the header and returns the inner `Request<()>`.
    pub fn into_inner(self) -> Request<()> {
        self.inner
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.inner.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Looks up a field value as text, ignoring the case of `name`.
    ///
    /// Returns `None` when the field is absent or its value is not visible ASCII.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|value| value.to_str().ok())
    }
}

/// Converts request parts into a RequestHeader.
impl From<Parts> for RequestHeader {
    #[inline]
    fn from(parts: Parts) -> Self {
        Self { inner: Request::from_parts(parts, ()) }
    }
}

/// Converts a bodyless request into a RequestHeader.
impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_lookup_ignores_case() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload?name=a")
            .header("Content-Type", "text/plain")
            .header("X-Trace", "abc")
            .body(())
            .unwrap();

        let header = RequestHeader::from(request);

        assert_eq!(header.method(), &Method::POST);
        assert_eq!(header.uri().path(), "/upload");
        assert_eq!(header.uri().query(), Some("name=a"));
        assert_eq!(header.field("content-type"), Some("text/plain"));
        assert_eq!(header.field("x-trace"), Some("abc"));
        assert_eq!(header.field("X-Missing"), None);
    }

    #[test]
    fn from_parts() {
        let (parts, ()) = Request::builder().uri("/").version(Version::HTTP_10).body(()).unwrap().into_parts();
        let header = RequestHeader::from(parts);

        assert_eq!(header.version(), Version::HTTP_10);
        assert_eq!(header.method(), &Method::GET);
        assert!(header.headers().is_empty());
    }
}
