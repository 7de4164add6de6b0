//! HTTP codec module for encoding and decoding HTTP messages
//!
//! The codec sits between a byte-stream session and structured messages and
//! works symmetrically for both roles:
//!
//! - client role ([`ClientCodec`]): [`HttpRequest`] → bytes, bytes → [`HttpResponse`]
//! - server role ([`ServerCodec`]): bytes → [`HttpRequest`], [`HttpResponse`] → bytes
//!
//! All codecs implement `tokio_util::codec::{Encoder, Decoder}`, so any
//! `Framed` transport can host them. Decoders return `Ok(None)` while a
//! message is incomplete; at end of stream an incomplete message becomes a
//! [`DecodeError`]. No state survives a complete message and nothing here
//! touches the network.
//!
//! # Architecture
//!
//! - Head handling via the `header` module (`httparse` based decoding, head encoding)
//! - Body handling via the `body` module (length, chunked and until-close bodies)
//! - [`RequestEncoder`] / [`ResponseDecoder`]: the client side
//! - [`RequestDecoder`] / [`ResponseEncoder`]: the server side
//!
//! # Example
//!
//! ```
//! use strand_http::codec::{decode_response, encode_request};
//! use strand_http::protocol::HttpRequest;
//!
//! let request = HttpRequest::get("http://127.0.0.1:28080/").build().unwrap();
//! let bytes = encode_request(request).unwrap();
//! assert!(bytes.starts_with(b"GET / HTTP/1.1\r\n"));
//!
//! let response = decode_response(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok").unwrap();
//! assert_eq!(&response.body()[..], b"ok");
//! ```

mod body;
mod header;
mod request_decoder;
mod request_encoder;
mod response_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use request_encoder::RequestEncoder;
pub use response_decoder::ResponseDecoder;
pub use response_encoder::ResponseEncoder;

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};
use http::Method;
use tokio_util::codec::{Decoder, Encoder};

use crate::protocol::{DecodeError, EncodeError, HttpRequest, HttpResponse};

/// Client side codec: encodes requests and decodes the matching responses.
///
/// Responses to `HEAD` requests are decoded without a body, so the codec
/// remembers the method of every request still waiting for its response.
#[derive(Debug, Default)]
pub struct ClientCodec {
    encoder: RequestEncoder,
    decoder: ResponseDecoder,
    pending_head: VecDeque<bool>,
}

impl ClientCodec {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Encoder<HttpRequest> for ClientCodec {
    type Error = EncodeError;

    fn encode(&mut self, item: HttpRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let is_head = item.method() == Method::HEAD;
        self.encoder.encode(item, dst)?;
        self.pending_head.push_back(is_head);
        Ok(())
    }
}

impl Decoder for ClientCodec {
    type Item = HttpResponse;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.prepare();
        let response = self.decoder.decode(src)?;
        self.complete(response.is_some());
        Ok(response)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.prepare();
        let response = self.decoder.decode_eof(src)?;
        self.complete(response.is_some());
        Ok(response)
    }
}

impl ClientCodec {
    fn prepare(&mut self) {
        if self.decoder.is_idle() && self.pending_head.front() == Some(&true) {
            self.decoder.expect_bodiless();
        }
    }

    fn complete(&mut self, decoded: bool) {
        if decoded {
            self.pending_head.pop_front();
        }
    }
}

/// Server side codec: decodes requests and encodes responses.
#[derive(Debug, Default)]
pub struct ServerCodec {
    decoder: RequestDecoder,
    encoder: ResponseEncoder,
}

impl ServerCodec {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Decoder for ServerCodec {
    type Item = HttpRequest;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode_eof(src)
    }
}

impl Encoder<HttpResponse> for ServerCodec {
    type Error = EncodeError;

    fn encode(&mut self, item: HttpResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encoder.encode(item, dst)
    }
}

/// Serializes a single request.
pub fn encode_request(request: HttpRequest) -> Result<Bytes, EncodeError> {
    let mut dst = BytesMut::new();
    RequestEncoder::new().encode(request, &mut dst)?;
    Ok(dst.freeze())
}

/// Parses one complete response from `bytes`.
///
/// The buffer is treated as the whole stream: a missing head terminator or a
/// body shorter than declared is an error, not a request for more data.
pub fn decode_response(bytes: &[u8]) -> Result<HttpResponse, DecodeError> {
    let mut src = BytesMut::from(bytes);
    ResponseDecoder::new().decode_eof(&mut src)?.ok_or(DecodeError::EmptyMessage)
}

/// Parses one complete request from `bytes`, with the same rules as [`decode_response`].
pub fn decode_request(bytes: &[u8]) -> Result<HttpRequest, DecodeError> {
    let mut src = BytesMut::from(bytes);
    RequestDecoder::new().decode_eof(&mut src)?.ok_or(DecodeError::EmptyMessage)
}

/// Serializes a single response.
pub fn encode_response(response: HttpResponse) -> Result<Bytes, EncodeError> {
    let mut dst = BytesMut::new();
    ResponseEncoder::new().encode(response, &mut dst)?;
    Ok(dst.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, StatusCode, header};
    use indoc::indoc;

    #[test]
    fn decode_reconstructs_status_headers_and_body() {
        let str = indoc! {r##"
        HTTP/1.1 206 Partial Content
        Content-Type: text/html
        Content-Range: bytes 0-9/500
        ETag: "00000000DEADBEEF"
        Content-Length: 10

        0123456789"##};

        let response = decode_response(str.replace('\n', "\r\n").as_bytes()).unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.status_text(), "Partial Content");
        assert_eq!(response.headers().get("CONTENT-RANGE").unwrap(), "bytes 0-9/500");
        assert_eq!(response.headers().get("etag").unwrap(), "\"00000000DEADBEEF\"");
        assert_eq!(&response.body()[..], b"0123456789");
    }

    #[test]
    fn decode_errors() {
        assert!(matches!(decode_response(b""), Err(DecodeError::EmptyMessage)));
        assert!(matches!(decode_response(b"HTTP/1.1 200 OK\r\nA: b\r\n"), Err(DecodeError::UnterminatedHeader { .. })));
        assert!(matches!(decode_response(b"HTTP/1.1 abc OK\r\n\r\n"), Err(DecodeError::InvalidStatusLine { .. })));
        assert!(matches!(
            decode_response(b"HTTP/1.1 200 OK\r\nContent-Length: 9\r\n\r\nshort"),
            Err(DecodeError::TruncatedBody { expected: 9, received: 5 })
        ));
    }

    #[test]
    fn server_role_round_trip() {
        let request = decode_request(b"GET /index.html?lang=en HTTP/1.1\r\nIf-None-Match: \"A\"\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/index.html");
        assert_eq!(request.param("lang"), Some("en"));
        assert_eq!(request.headers().get(header::IF_NONE_MATCH).unwrap(), "\"A\"");

        let mut response = HttpResponse::new(StatusCode::NOT_MODIFIED);
        response.headers_mut().insert(header::ETAG, HeaderValue::from_static("\"A\""));
        let bytes = encode_response(response).unwrap();
        assert_eq!(&bytes[..], b"HTTP/1.1 304 Not Modified\r\netag: \"A\"\r\n\r\n");
    }

    #[test]
    fn client_codec_skips_body_of_head_response() {
        let mut codec = ClientCodec::new();
        let mut dst = BytesMut::new();
        codec.encode(HttpRequest::builder().method(Method::HEAD).uri("/a").build().unwrap(), &mut dst).unwrap();
        codec.encode(HttpRequest::get("/b").build().unwrap(), &mut dst).unwrap();

        let mut src = BytesMut::from(
            "HTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 3\r\n\r\nabc",
        );
        let head = codec.decode(&mut src).unwrap().unwrap();
        assert!(head.body().is_empty());
        let get = codec.decode(&mut src).unwrap().unwrap();
        assert_eq!(&get.body()[..], b"abc");
    }
}
