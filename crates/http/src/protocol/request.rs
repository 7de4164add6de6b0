//! HTTP request message.
//!
//! [`HttpRequest`] wraps a bodyless `http::Request<()>` for the start line and
//! headers, and carries the request parameters and the complete body next to
//! it. Requests are built once by the caller through [`RequestBuilder`] and
//! are not mutated after being handed to the codec.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Uri, Version};

use crate::protocol::Params;

/// A complete HTTP request: start line, headers, parameters and body.
#[derive(Debug)]
pub struct HttpRequest {
    head: Request<()>,
    params: Params,
    body: Bytes,
}

impl HttpRequest {
    /// Starts building a request.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Starts building a `GET` request for `uri`.
    pub fn get<T>(uri: T) -> RequestBuilder
    where
        T: TryInto<Uri>,
        <T as TryInto<Uri>>::Error: Into<http::Error>,
    {
        RequestBuilder::new().method(Method::GET).uri(uri)
    }

    /// Starts building a `POST` request for `uri`.
    pub fn post<T>(uri: T) -> RequestBuilder
    where
        T: TryInto<Uri>,
        <T as TryInto<Uri>>::Error: Into<http::Error>,
    {
        RequestBuilder::new().method(Method::POST).uri(uri)
    }

    /// Assembles a request from already validated parts.
    pub fn from_parts(head: Request<()>, params: Params, body: Bytes) -> Self {
        Self { head, params, body }
    }

    pub fn into_parts(self) -> (Request<()>, Params, Bytes) {
        (self.head, self.params, self.body)
    }

    /// Returns a reference to the request's HTTP method.
    pub fn method(&self) -> &Method {
        self.head.method()
    }

    /// Returns a reference to the request's URI.
    pub fn uri(&self) -> &Uri {
        self.head.uri()
    }

    /// Returns the target path, without the query string.
    pub fn path(&self) -> &str {
        self.head.uri().path()
    }

    /// Returns the request's HTTP version.
    pub fn version(&self) -> Version {
        self.head.version()
    }

    /// Returns a reference to the request's headers.
    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Looks up a single query or form parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Determines if this request carries a body based on its HTTP method.
    ///
    /// Returns false for methods that don't carry bodies:
    /// - GET
    /// - HEAD
    /// - DELETE
    /// - OPTIONS
    /// - CONNECT
    /// - TRACE
    pub fn need_body(&self) -> bool {
        method_allows_body(self.method())
    }
}

pub(crate) fn method_allows_body(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::DELETE | Method::OPTIONS | Method::CONNECT | Method::TRACE)
}

/// Builder for [`HttpRequest`].
///
/// Validation errors of the method, uri or headers are deferred to
/// [`RequestBuilder::build`], the same way `http::request::Builder` does it.
#[derive(Debug)]
pub struct RequestBuilder {
    inner: http::request::Builder,
    params: Params,
    body: Bytes,
}

impl RequestBuilder {
    fn new() -> Self {
        Self { inner: Request::builder().version(Version::HTTP_11), params: Params::new(), body: Bytes::new() }
    }

    #[must_use]
    pub fn method<T>(mut self, method: T) -> Self
    where
        T: TryInto<Method>,
        <T as TryInto<Method>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.method(method);
        self
    }

    #[must_use]
    pub fn uri<T>(mut self, uri: T) -> Self
    where
        T: TryInto<Uri>,
        <T as TryInto<Uri>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.uri(uri);
        self
    }

    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.inner = self.inner.version(version);
        self
    }

    #[must_use]
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        <K as TryInto<HeaderName>>::Error: Into<http::Error>,
        V: TryInto<HeaderValue>,
        <V as TryInto<HeaderValue>>::Error: Into<http::Error>,
    {
        self.inner = self.inner.header(key, value);
        self
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<HttpRequest, http::Error> {
        let head = self.inner.body(())?;
        Ok(HttpRequest { head, params: self.params, body: self.body })
    }
}
