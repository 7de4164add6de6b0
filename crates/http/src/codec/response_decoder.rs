//! HTTP response decoder, used by the client role.
//!
//! The decoder works in two phases: the response head is parsed with
//! [`ResponseHeaderDecoder`], then the body is collected by a
//! [`PayloadDecoder`] chosen from the head's framing. Only complete
//! responses are yielded; partial input returns `Ok(None)` so a `Framed`
//! transport keeps reading.
//!
//! # Example
//!
//! ```
//! use strand_http::codec::ResponseDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = ResponseDecoder::new();
//! let mut buffer = BytesMut::from("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi");
//! let response = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(&response.body()[..], b"hi");
//! ```

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::PayloadDecoder;
use crate::codec::header::{ResponseHeadParts, ResponseHeaderDecoder};
use crate::protocol::{DecodeError, HttpResponse, PayloadSize};

/// A decoder for complete HTTP responses.
///
/// # State Machine
///
/// The decoder keeps its state in the `in_flight` field:
/// - `None`: currently parsing the head
/// - `Some(_)`: head parsed, currently collecting the body
#[derive(Debug)]
pub struct ResponseDecoder {
    header_decoder: ResponseHeaderDecoder,
    in_flight: Option<InFlight>,
    bodiless: bool,
}

#[derive(Debug)]
struct InFlight {
    parts: ResponseHeadParts,
    payload_decoder: PayloadDecoder,
}

impl ResponseDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    /// The next response answers a `HEAD` request and carries no body whatever its headers say.
    pub fn expect_bodiless(&mut self) {
        self.bodiless = true;
    }

    /// Returns true when no response is partially decoded.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }
}

impl Default for ResponseDecoder {
    fn default() -> Self {
        Self { header_decoder: ResponseHeaderDecoder, in_flight: None, bodiless: false }
    }
}

impl Decoder for ResponseDecoder {
    type Item = HttpResponse;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.in_flight.is_none() {
            let Some((parts, payload_size)) = self.header_decoder.decode(src)? else {
                return Ok(None);
            };
            let payload_size = if std::mem::take(&mut self.bodiless) { PayloadSize::Empty } else { payload_size };
            trace!(status = parts.head.status().as_u16(), ?payload_size, "decoded response head");
            self.in_flight = Some(InFlight { parts, payload_decoder: payload_size.into() });
        }

        let Some(in_flight) = self.in_flight.as_mut() else {
            return Ok(None);
        };

        match in_flight.payload_decoder.decode(src)? {
            Some(body) => Ok(self.finish(body)),
            None => Ok(None),
        }
    }

    /// Turns an incomplete buffer at end of stream into an error.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(response) = self.decode(src)? {
            return Ok(Some(response));
        }

        match self.in_flight.as_mut() {
            Some(in_flight) => match in_flight.payload_decoder.decode_eof(src)? {
                Some(body) => Ok(self.finish(body)),
                None => Ok(None),
            },
            None if src.is_empty() => Ok(None),
            None => Err(DecodeError::unterminated_header(src.len())),
        }
    }
}

impl ResponseDecoder {
    fn finish(&mut self, body: Bytes) -> Option<HttpResponse> {
        let InFlight { parts, .. } = self.in_flight.take()?;
        trace!(body_size = body.len(), "decoded response body");
        Some(HttpResponse::from_parts(parts.head, parts.reason, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use indoc::indoc;

    #[test]
    fn decodes_length_framed_response() {
        let str = indoc! {r##"
        HTTP/1.1 200 OK
        Content-Type: text/plain
        Content-Length: 5

        hello"##};
        let mut buffer = BytesMut::from(str.replace('\n', "\r\n").as_str());

        let response = ResponseDecoder::new().decode(&mut buffer).unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.status_text(), "OK");
        assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");
        assert_eq!(&response.body()[..], b"hello");
        assert!(buffer.is_empty());
    }

    #[test]
    fn waits_for_the_whole_body() {
        let mut decoder = ResponseDecoder::new();
        let mut buffer = BytesMut::from("HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n01234");

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert!(!decoder.is_idle());

        buffer.extend_from_slice(b"56789");
        let response = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&response.body()[..], b"0123456789");
        assert!(decoder.is_idle());
    }

    #[test]
    fn decodes_consecutive_responses() {
        let mut decoder = ResponseDecoder::new();
        let mut buffer = BytesMut::from(
            "HTTP/1.1 304 Not Modified\r\nETag: \"A\"\r\n\r\nHTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n0\r\n\r\n",
        );

        let first = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(first.status(), StatusCode::NOT_MODIFIED);
        assert!(first.body().is_empty());

        let second = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(&second.body()[..], b"abc");
        assert!(buffer.is_empty());
    }

    #[test]
    fn until_close_body_completes_at_eof() {
        let mut decoder = ResponseDecoder::new();
        let mut buffer = BytesMut::from("HTTP/1.0 200 OK\r\n\r\nstreamed");

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        let response = decoder.decode_eof(&mut buffer).unwrap().unwrap();
        assert_eq!(&response.body()[..], b"streamed");
        assert!(decoder.decode_eof(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn truncated_body_at_eof() {
        let mut buffer = BytesMut::from("HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc");
        let result = ResponseDecoder::new().decode_eof(&mut buffer);
        assert!(matches!(result, Err(DecodeError::TruncatedBody { expected: 10, received: 3 })));
    }

    #[test]
    fn unterminated_head_at_eof() {
        let mut buffer = BytesMut::from("HTTP/1.1 200 OK\r\nContent-Le");
        let result = ResponseDecoder::new().decode_eof(&mut buffer);
        assert!(matches!(result, Err(DecodeError::UnterminatedHeader { received: 27 })));
    }

    #[test]
    fn head_response_ignores_content_length() {
        let mut decoder = ResponseDecoder::new();
        decoder.expect_bodiless();
        let mut buffer = BytesMut::from("HTTP/1.1 200 OK\r\nContent-Length: 1024\r\n\r\n");

        let response = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(response.headers().get("content-length").unwrap(), "1024");
        assert!(response.body().is_empty());
    }
}
