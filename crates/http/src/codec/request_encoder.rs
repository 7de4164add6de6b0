//! HTTP request encoder, used by the client role.
//!
//! Writes the request line, the headers and the body of an [`HttpRequest`].
//! Request parameters are placed where the method allows:
//!
//! - methods without a body (`GET`, `HEAD`, ...) carry them in the query string
//! - other methods send them as an `application/x-www-form-urlencoded` body
//!   when no explicit body was set, and in the query string otherwise
//!
//! A `Host` header is derived from the request uri when the caller did not
//! set one, and `Content-Length` always reflects the body actually written.

use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};
use http::{HeaderMap, HeaderValue, Uri, header};
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::header::encode_request_head;
use crate::protocol::{EncodeError, HttpRequest, Params, method_allows_body};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An encoder for complete HTTP requests; holds no state between messages.
#[derive(Debug, Default)]
pub struct RequestEncoder;

impl RequestEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<HttpRequest> for RequestEncoder {
    type Error = EncodeError;

    fn encode(&mut self, item: HttpRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (head, params, body) = item.into_parts();
        let (parts, ()) = head.into_parts();
        let allows_body = method_allows_body(&parts.method);

        let mut headers = parts.headers;
        let (query_params, body) = if !params.is_empty() && allows_body && body.is_empty() {
            if !headers.contains_key(header::CONTENT_TYPE) {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
            }
            (None, Bytes::from(params.to_urlencoded()?))
        } else if params.is_empty() {
            (None, body)
        } else {
            (Some(&params), body)
        };

        insert_host(&parts.uri, &mut headers);
        let target = request_target(&parts.uri, query_params)?;

        let content_length = (allows_body || !body.is_empty()).then_some(body.len() as u64);
        trace!(method = %parts.method, target = %target, body_size = body.len(), "encoding request");

        encode_request_head(&parts.method, &target, parts.version, &headers, content_length, dst)?;
        dst.put_slice(&body);
        Ok(())
    }
}

/// Builds the origin-form target: path plus the merged query string.
fn request_target<'a>(uri: &'a Uri, params: Option<&Params>) -> Result<Cow<'a, str>, EncodeError> {
    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    let Some(params) = params else {
        return Ok(Cow::Borrowed(path_and_query));
    };

    let encoded = params.to_urlencoded()?;
    let target = match uri.query() {
        Some(query) if !query.is_empty() => format!("{}?{}&{}", uri.path(), query, encoded),
        _ => format!("{}?{}", uri.path(), encoded),
    };
    Ok(Cow::Owned(target))
}

fn insert_host(uri: &Uri, headers: &mut HeaderMap) {
    if headers.contains_key(header::HOST) {
        return;
    }
    if let Some(value) = uri.authority().and_then(|authority| HeaderValue::from_str(authority.as_str()).ok()) {
        headers.insert(header::HOST, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(request: HttpRequest) -> String {
        let mut dst = BytesMut::new();
        RequestEncoder::new().encode(request, &mut dst).unwrap();
        String::from_utf8(dst.to_vec()).unwrap()
    }

    #[test]
    fn get_params_go_to_query() {
        let request = HttpRequest::get("http://127.0.0.1:28080/monitor?x=1")
            .param("Type", "ThreadCount")
            .build()
            .unwrap();

        assert_eq!(encode(request), "GET /monitor?x=1&Type=ThreadCount HTTP/1.1\r\nhost: 127.0.0.1:28080\r\n\r\n");
    }

    #[test]
    fn post_params_become_form_body() {
        let request = HttpRequest::post("/form").param("age", "32").param("name", "a b").build().unwrap();

        assert_eq!(
            encode(request),
            "POST /form HTTP/1.1\r\ncontent-type: application/x-www-form-urlencoded\r\ncontent-length: 15\r\n\r\nage=32&name=a+b"
        );
    }

    #[test]
    fn explicit_body_keeps_params_in_query() {
        let request = HttpRequest::post("/upload").param("id", "7").body("raw").build().unwrap();

        assert_eq!(encode(request), "POST /upload?id=7 HTTP/1.1\r\ncontent-length: 3\r\n\r\nraw");
    }

    #[test]
    fn caller_host_is_kept() {
        let request = HttpRequest::get("http://example.com/").header("Host", "other.org").build().unwrap();

        assert_eq!(encode(request), "GET / HTTP/1.1\r\nhost: other.org\r\n\r\n");
    }

    #[test]
    fn empty_post_declares_zero_length() {
        let request = HttpRequest::post("/ping").build().unwrap();
        assert_eq!(encode(request), "POST /ping HTTP/1.1\r\ncontent-length: 0\r\n\r\n");
    }
}
