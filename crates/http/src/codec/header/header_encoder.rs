//! HTTP head encoders for requests and responses.
//!
//! Writes the start line followed by every header field. `Content-Length` and
//! `Transfer-Encoding` are owned by the encoder: whatever the caller put in
//! the header map is replaced by the framing of the body actually written.

use bytes::{BufMut, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Version, header};
use std::io;
use std::io::Write;
use tracing::error;

use crate::protocol::EncodeError;

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 1024;

/// Writes `METHOD target HTTP/1.x` followed by the headers and the blank line.
pub fn encode_request_head(
    method: &Method,
    target: &str,
    version: Version,
    headers: &HeaderMap,
    content_length: Option<u64>,
    dst: &mut BytesMut,
) -> Result<(), EncodeError> {
    let version = version_str(version)?;
    dst.reserve(INIT_HEADER_SIZE);
    write!(FastWrite(dst), "{} {} {}\r\n", method.as_str(), target, version)?;
    write_headers(headers, content_length, dst);
    Ok(())
}

/// Writes `HTTP/1.x code reason` followed by the headers and the blank line.
pub fn encode_response_head(
    status: StatusCode,
    reason: &str,
    version: Version,
    headers: &HeaderMap,
    content_length: Option<u64>,
    dst: &mut BytesMut,
) -> Result<(), EncodeError> {
    let version = version_str(version)?;
    dst.reserve(INIT_HEADER_SIZE);
    write!(FastWrite(dst), "{} {} {}\r\n", version, status.as_str(), reason)?;
    write_headers(headers, content_length, dst);
    Ok(())
}

fn version_str(version: Version) -> Result<&'static str, EncodeError> {
    match version {
        Version::HTTP_11 => Ok("HTTP/1.1"),
        Version::HTTP_10 => Ok("HTTP/1.0"),
        v => {
            error!(http_version = ?v, "unsupported http version");
            Err(EncodeError::UnsupportedVersion(v))
        }
    }
}

fn write_headers(headers: &HeaderMap, content_length: Option<u64>, dst: &mut BytesMut) {
    for (header_name, header_value) in headers {
        if is_framing_header(header_name) {
            continue;
        }
        put_header(dst, header_name, header_value);
    }

    if let Some(length) = content_length {
        put_header(dst, &header::CONTENT_LENGTH, &HeaderValue::from(length));
    }
    dst.put_slice(b"\r\n");
}

fn is_framing_header(name: &HeaderName) -> bool {
    *name == header::CONTENT_LENGTH || *name == header::TRANSFER_ENCODING
}

fn put_header(dst: &mut BytesMut, name: &HeaderName, value: &HeaderValue) {
    dst.put_slice(name.as_ref());
    dst.put_slice(b": ");
    dst.put_slice(value.as_ref());
    dst.put_slice(b"\r\n");
}

/// Fast writer implementation for writing to `BytesMut`.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
