//! HTTP response message.
//!
//! [`HttpResponse`] keeps the status line and headers in a bodyless
//! `http::Response<()>` and stores the reason phrase separately, because the
//! `http` crate only knows canonical reasons while a decoded response must
//! report whatever text the peer sent.

use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode, Version};

/// A complete HTTP response: status line, headers and body.
#[derive(Debug)]
pub struct HttpResponse {
    head: Response<()>,
    reason: Option<String>,
    body: Bytes,
}

impl HttpResponse {
    /// Creates an empty `HTTP/1.1` response with the given status.
    pub fn new(status: StatusCode) -> Self {
        let mut head = Response::new(());
        *head.status_mut() = status;
        Self { head, reason: None, body: Bytes::new() }
    }

    /// Creates a `200 OK` response with the given body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        let mut response = Self::new(StatusCode::OK);
        response.set_body(body);
        response
    }

    /// Assembles a response from decoded parts.
    pub fn from_parts(head: Response<()>, reason: Option<String>, body: Bytes) -> Self {
        Self { head, reason, body }
    }

    pub fn into_parts(self) -> (Response<()>, Option<String>, Bytes) {
        (self.head, self.reason, self.body)
    }

    pub fn status(&self) -> StatusCode {
        self.head.status()
    }

    /// Changes the status; a previously decoded reason phrase is dropped.
    pub fn set_status(&mut self, status: StatusCode) {
        *self.head.status_mut() = status;
        self.reason = None;
    }

    /// Returns the reason phrase received on the wire, or the canonical one.
    pub fn status_text(&self) -> &str {
        match &self.reason {
            Some(reason) => reason,
            None => self.head.status().canonical_reason().unwrap_or(""),
        }
    }

    pub fn version(&self) -> Version {
        self.head.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.head.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.head.headers_mut()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Whether the status forbids a message body (1xx, 204 and 304).
    pub fn is_bodiless(&self) -> bool {
        status_forbids_body(self.status())
    }
}

pub(crate) fn status_forbids_body(status: StatusCode) -> bool {
    status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED
}
