//! HTTP head decoders for requests and responses.
//!
//! Both decoders parse the start line and header fields with `httparse`,
//! record the byte ranges of every header name and value, then split the head
//! off the source buffer and build the header map from shared slices of it,
//! so header values are not copied.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum header size: 8KB
//! - Maximum request body size: 8MB, checked against `Content-Length` here
//!   and while collecting chunked data
//! - Only HTTP/1.0 and HTTP/1.1

use bytes::{Bytes, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, Response, StatusCode, Uri, Version};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{DecodeError, PayloadSize, method_allows_body, status_forbids_body};

/// Maximum number of headers allowed in a message
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire header section
pub(crate) const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Maximum size in bytes of a request body the server role will buffer
pub(crate) const MAX_BODY_BYTES: u64 = 8 * 1024 * 1024;

/// A decoded response head together with the reason phrase sent by the peer.
#[derive(Debug)]
pub struct ResponseHeadParts {
    pub head: Response<()>,
    pub reason: Option<String>,
}

/// Decoder for request heads, used by the server role.
#[derive(Debug)]
pub struct RequestHeaderDecoder;

/// Decoder for response heads, used by the client role.
#[derive(Debug)]
pub struct ResponseHeaderDecoder;

impl Decoder for RequestHeaderDecoder {
    type Item = (Request<()>, PayloadSize);
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // "GET / HTTP/1.1\n\n" is the smallest complete request head
        if src.len() < 16 {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut req = httparse::Request::new(&mut headers);

        let status = req.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => DecodeError::too_many_headers(MAX_HEADER_NUM),
            Error::Version => DecodeError::InvalidVersion(None),
            e => DecodeError::invalid_header(e),
        })?;

        let body_offset = match status {
            Status::Complete(body_offset) => body_offset,
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, DecodeError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            }
        };

        trace!(head_size = body_offset, "parsed request head");
        ensure!(body_offset <= MAX_HEADER_BYTES, DecodeError::too_large_header(body_offset, MAX_HEADER_BYTES));

        let version = to_version(req.version)?;
        let method = Method::from_bytes(req.method.ok_or(DecodeError::InvalidMethod)?.as_bytes())
            .map_err(|_| DecodeError::InvalidMethod)?;
        let uri = Uri::try_from(req.path.ok_or(DecodeError::InvalidUri)?).map_err(|_| DecodeError::InvalidUri)?;

        let header_count = req.headers.len();
        let mut header_index = [EMPTY_HEADER_INDEX; MAX_HEADER_NUM];
        HeaderIndex::record(src, req.headers, &mut header_index);

        let header_bytes = src.split_to(body_offset).freeze();

        let mut builder = Request::builder().method(method).uri(uri).version(version);
        if let Some(headers) = builder.headers_mut() {
            fill_headers(&header_bytes, &header_index[..header_count], headers)?;
        }
        let head = builder.body(()).map_err(DecodeError::invalid_header)?;

        let payload_size = request_payload(&head)?;
        Ok(Some((head, payload_size)))
    }
}

impl Decoder for ResponseHeaderDecoder {
    type Item = (ResponseHeadParts, PayloadSize);
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
        let mut resp = httparse::Response::new(&mut headers);

        let status = resp.parse(src).map_err(|e| match e {
            Error::TooManyHeaders => DecodeError::too_many_headers(MAX_HEADER_NUM),
            e @ (Error::Status | Error::Version | Error::Token) => DecodeError::invalid_status_line(e),
            e => DecodeError::invalid_header(e),
        })?;

        let body_offset = match status {
            Status::Complete(body_offset) => body_offset,
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, DecodeError::too_large_header(src.len(), MAX_HEADER_BYTES));
                return Ok(None);
            }
        };

        trace!(head_size = body_offset, "parsed response head");
        ensure!(body_offset <= MAX_HEADER_BYTES, DecodeError::too_large_header(body_offset, MAX_HEADER_BYTES));

        let version = to_version(resp.version)?;
        let code = resp.code.ok_or_else(|| DecodeError::invalid_status_line("missing status code"))?;
        let status = StatusCode::from_u16(code).map_err(|_| DecodeError::InvalidStatus(code))?;
        let reason = resp.reason.filter(|reason| !reason.is_empty()).map(str::to_owned);

        let header_count = resp.headers.len();
        let mut header_index = [EMPTY_HEADER_INDEX; MAX_HEADER_NUM];
        HeaderIndex::record(src, resp.headers, &mut header_index);

        let header_bytes = src.split_to(body_offset).freeze();

        let mut builder = Response::builder().status(status).version(version);
        if let Some(headers) = builder.headers_mut() {
            fill_headers(&header_bytes, &header_index[..header_count], headers)?;
        }
        let head = builder.body(()).map_err(DecodeError::invalid_header)?;

        let payload_size = response_payload(&head)?;
        Ok(Some((ResponseHeadParts { head, reason }, payload_size)))
    }
}

fn to_version(version: Option<u8>) -> Result<Version, DecodeError> {
    match version {
        Some(0) => Ok(Version::HTTP_10),
        Some(1) => Ok(Version::HTTP_11),
        // Currently HTTP/2 and HTTP/3 not supported
        v => Err(DecodeError::InvalidVersion(v)),
    }
}

fn fill_headers(header_bytes: &Bytes, indices: &[HeaderIndex], headers: &mut HeaderMap) -> Result<(), DecodeError> {
    headers.reserve(indices.len());
    for index in indices {
        let name = HeaderName::from_bytes(&header_bytes[index.name.0..index.name.1]).map_err(DecodeError::invalid_header)?;
        let value = HeaderValue::from_maybe_shared(header_bytes.slice(index.value.0..index.value.1))
            .map_err(DecodeError::invalid_header)?;
        headers.append(name, value);
    }
    Ok(())
}

/// Stores the byte range positions of a header's name and value within the original buffer.
#[derive(Clone, Copy)]
struct HeaderIndex {
    name: (usize, usize),
    value: (usize, usize),
}

const EMPTY_HEADER_INDEX: HeaderIndex = HeaderIndex { name: (0, 0), value: (0, 0) };

impl HeaderIndex {
    fn record(bytes: &[u8], headers: &[httparse::Header<'_>], indices: &mut [HeaderIndex]) {
        let bytes_ptr = bytes.as_ptr() as usize;
        for (header, indices) in headers.iter().zip(indices.iter_mut()) {
            let name_start = header.name.as_ptr() as usize - bytes_ptr;
            indices.name = (name_start, name_start + header.name.len());
            let value_start = header.value.as_ptr() as usize - bytes_ptr;
            indices.value = (value_start, value_start + header.value.len());
        }
    }
}

/// Determines the body framing of a request according to RFC 9112 section 6.3.
fn request_payload(head: &Request<()>) -> Result<PayloadSize, DecodeError> {
    if !method_allows_body(head.method()) {
        return Ok(PayloadSize::Empty);
    }

    match framing_headers(head.headers())? {
        Framing::Chunked => Ok(PayloadSize::Chunked),
        Framing::Length(length) => {
            ensure!(length <= MAX_BODY_BYTES, DecodeError::too_large_body(length, MAX_BODY_BYTES));
            Ok(PayloadSize::new_length(length))
        }
        // a request without framing headers has no body
        Framing::OtherEncoding | Framing::None => Ok(PayloadSize::Empty),
    }
}

/// Determines the body framing of a response according to RFC 9112 section 6.3.
fn response_payload(head: &Response<()>) -> Result<PayloadSize, DecodeError> {
    if status_forbids_body(head.status()) {
        return Ok(PayloadSize::Empty);
    }

    match framing_headers(head.headers())? {
        Framing::Chunked => Ok(PayloadSize::Chunked),
        Framing::Length(length) => Ok(PayloadSize::new_length(length)),
        Framing::OtherEncoding | Framing::None => Ok(PayloadSize::UntilClose),
    }
}

enum Framing {
    Chunked,
    Length(u64),
    OtherEncoding,
    None,
}

fn framing_headers(headers: &HeaderMap) -> Result<Framing, DecodeError> {
    // refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-transfer-encoding
    let te_header = headers.get(http::header::TRANSFER_ENCODING);
    let cl_header = headers.get(http::header::CONTENT_LENGTH);

    match (te_header, cl_header) {
        (None, None) => Ok(Framing::None),

        (Some(te_value), None) => {
            if is_chunked(te_value) {
                Ok(Framing::Chunked)
            } else {
                Ok(Framing::OtherEncoding)
            }
        }

        (None, Some(cl_value)) => {
            let cl_str = cl_value.to_str().map_err(|_| DecodeError::invalid_content_length("value can't to_str"))?;
            let length = cl_str
                .trim()
                .parse::<u64>()
                .map_err(|_| DecodeError::invalid_content_length(format!("value {cl_str} is not u64")))?;
            Ok(Framing::Length(length))
        }

        (Some(_), Some(_)) => {
            Err(DecodeError::invalid_content_length("transfer_encoding and content_length both present in headers"))
        }
    }
}

/// Checks if the Transfer-Encoding header indicates chunked encoding.
///
/// According to RFC 7230, chunked must be the last encoding if present.
fn is_chunked(header_value: &HeaderValue) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    header_value.as_bytes().rsplit(|b| *b == b',').next().is_some_and(|last| last.trim_ascii().eq_ignore_ascii_case(CHUNKED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn check_is_chunked() {
        assert!(is_chunked(&HeaderValue::from_static("gzip, chunked")));
        assert!(is_chunked(&HeaderValue::from_static("Chunked")));
        assert!(!is_chunked(&HeaderValue::from_static("chunked, gzip")));
        assert!(!is_chunked(&HeaderValue::from_static("gzip")));
    }

    #[test]
    fn request_head_leaves_body_in_buffer() {
        let str = indoc! {r##"
        POST /form HTTP/1.1
        Host: 127.0.0.1:8080
        Content-Length: 3

        123"##};

        let mut bytes = BytesMut::from(str);
        let (head, payload_size) = RequestHeaderDecoder.decode(&mut bytes).unwrap().unwrap();

        assert_eq!(head.method(), &Method::POST);
        assert_eq!(head.uri().path(), "/form");
        assert_eq!(payload_size, PayloadSize::Length(3));
        assert_eq!(&bytes[..], &b"123"[..]);
    }

    #[test]
    fn request_from_curl() {
        let str = indoc! {r##"
        GET /index/?a=1&b=2&a=3 HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let mut buf = BytesMut::from(str);
        let (head, payload_size) = RequestHeaderDecoder.decode(&mut buf).unwrap().unwrap();

        assert!(payload_size.is_empty());
        assert_eq!(head.method(), &Method::GET);
        assert_eq!(head.version(), Version::HTTP_11);
        assert_eq!(head.uri().path(), "/index/");
        assert_eq!(head.uri().query(), Some("a=1&b=2&a=3"));
        assert_eq!(head.headers().len(), 3);
        assert_eq!(head.headers().get(http::header::USER_AGENT).unwrap(), "curl/7.79.1");
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_request_head_needs_more_data() {
        let mut buf = BytesMut::from("GET /index.html HTTP/1.1\r\nHost: 127.0.0.1\r\n");
        assert!(RequestHeaderDecoder.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 43);
    }

    #[test]
    fn response_head_keeps_reason_phrase() {
        let mut buf = BytesMut::from("HTTP/1.1 404 Nothing Here\r\nContent-Length: 2\r\nX-Trace: abc\r\n\r\nno");
        let (parts, payload_size) = ResponseHeaderDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(parts.head.status(), StatusCode::NOT_FOUND);
        assert_eq!(parts.reason.as_deref(), Some("Nothing Here"));
        assert_eq!(parts.head.headers().get("x-trace").unwrap(), "abc");
        assert_eq!(payload_size, PayloadSize::Length(2));
        assert_eq!(&buf[..], b"no");
    }

    #[test]
    fn response_framing() {
        let cases = [
            ("HTTP/1.1 304 Not Modified\r\nContent-Length: 10\r\n\r\n", PayloadSize::Empty),
            ("HTTP/1.1 204 No Content\r\n\r\n", PayloadSize::Empty),
            ("HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n", PayloadSize::Chunked),
            ("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n", PayloadSize::Empty),
            ("HTTP/1.1 200 OK\r\n\r\n", PayloadSize::UntilClose),
        ];

        for (raw, expected) in cases {
            let mut buf = BytesMut::from(raw);
            let (_, payload_size) = ResponseHeaderDecoder.decode(&mut buf).unwrap().unwrap();
            assert_eq!(payload_size, expected, "framing of {raw:?}");
        }
    }

    #[test]
    fn malformed_status_line() {
        let mut buf = BytesMut::from("HTTP/1.1 abc OK\r\n\r\n");
        assert!(matches!(ResponseHeaderDecoder.decode(&mut buf), Err(DecodeError::InvalidStatusLine { .. })));

        let mut buf = BytesMut::from("HTTX/1.1 200 OK\r\n\r\n");
        assert!(ResponseHeaderDecoder.decode(&mut buf).is_err());
    }

    #[test]
    fn conflicting_framing_headers() {
        let mut buf = BytesMut::from("HTTP/1.1 200 OK\r\nContent-Length: 3\r\nTransfer-Encoding: chunked\r\n\r\n");
        assert!(matches!(ResponseHeaderDecoder.decode(&mut buf), Err(DecodeError::InvalidContentLength { .. })));
    }

    #[test]
    fn oversized_partial_head() {
        let mut raw = String::from("HTTP/1.1 200 OK\r\n");
        let filler = format!("X-Filler: {}\r\n", "a".repeat(256));
        while raw.len() <= MAX_HEADER_BYTES {
            raw.push_str(&filler);
        }
        let mut buf = BytesMut::from(raw.as_str());
        assert!(matches!(ResponseHeaderDecoder.decode(&mut buf), Err(DecodeError::TooLargeHeader { .. })));
    }
}
