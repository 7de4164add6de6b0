//! HTTP request decoder, used by the server role.
//!
//! Works like the [`ResponseDecoder`](crate::codec::ResponseDecoder): the
//! head is parsed with [`RequestHeaderDecoder`], the body is collected by a
//! [`PayloadDecoder`], and a complete [`HttpRequest`] is yielded.
//!
//! Request parameters are read back from the query string and, when the
//! body is `application/x-www-form-urlencoded`, from the body as well. Body
//! parameters win over query parameters with the same name.
//!
//! Bodies are buffered whole, so their size is bounded: a `Content-Length`
//! above the limit is rejected with the head, chunked data as soon as the
//! announced chunks pass it.

use bytes::{Bytes, BytesMut};
use http::{Request, header};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::body::PayloadDecoder;
use crate::codec::header::{MAX_BODY_BYTES, RequestHeaderDecoder};
use crate::protocol::{DecodeError, HttpRequest, Params, PayloadSize};

/// A decoder for complete HTTP requests.
///
/// The decoder keeps its state in the `in_flight` field:
/// - `None`: currently parsing the head
/// - `Some(_)`: head parsed, currently collecting the body
#[derive(Debug)]
pub struct RequestDecoder {
    header_decoder: RequestHeaderDecoder,
    in_flight: Option<(Request<()>, PayloadDecoder)>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self { header_decoder: RequestHeaderDecoder, in_flight: None }
    }
}

impl Decoder for RequestDecoder {
    type Item = HttpRequest;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.in_flight.is_none() {
            let Some((head, payload_size)) = self.header_decoder.decode(src)? else {
                return Ok(None);
            };
            trace!(method = %head.method(), uri = %head.uri(), ?payload_size, "decoded request head");
            let payload_decoder = match payload_size {
                PayloadSize::Chunked => PayloadDecoder::chunked_with_limit(MAX_BODY_BYTES),
                payload_size => payload_size.into(),
            };
            self.in_flight = Some((head, payload_decoder));
        }

        let Some((_, payload_decoder)) = self.in_flight.as_mut() else {
            return Ok(None);
        };

        match payload_decoder.decode(src)? {
            Some(body) => self.finish(body).map(Some),
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(request) = self.decode(src)? {
            return Ok(Some(request));
        }

        match self.in_flight.as_mut() {
            Some((_, payload_decoder)) => match payload_decoder.decode_eof(src)? {
                Some(body) => self.finish(body).map(Some),
                None => Ok(None),
            },
            None if src.is_empty() => Ok(None),
            None => Err(DecodeError::unterminated_header(src.len())),
        }
    }
}

impl RequestDecoder {
    fn finish(&mut self, body: Bytes) -> Result<HttpRequest, DecodeError> {
        let (head, _) = self.in_flight.take().ok_or(DecodeError::EmptyMessage)?;
        let params = parse_params(&head, &body)?;
        trace!(body_size = body.len(), params = params.len(), "decoded request body");
        Ok(HttpRequest::from_parts(head, params, body))
    }
}

fn parse_params(head: &Request<()>, body: &Bytes) -> Result<Params, DecodeError> {
    let mut params = Params::new();
    if let Some(query) = head.uri().query() {
        params.extend_from_urlencoded(query)?;
    }

    if !body.is_empty() && is_form(head) {
        let form = std::str::from_utf8(body).map_err(DecodeError::invalid_params)?;
        params.extend_from_urlencoded(form)?;
    }
    Ok(params)
}

fn is_form(head: &Request<()>) -> bool {
    head.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|mime| mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Method, Version};
    use indoc::indoc;

    #[test]
    fn decodes_get_with_query_params() {
        let str = indoc! {r##"
        GET /monitor?Type=Log&Param1=ACCESS&Param2=20 HTTP/1.1
        Host: 127.0.0.1:28080
        Accept: */*

        "##};
        let mut buffer = BytesMut::from(str.replace('\n', "\r\n").as_str());

        let request = RequestDecoder::new().decode(&mut buffer).unwrap().unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/monitor");
        assert_eq!(request.version(), Version::HTTP_11);
        assert_eq!(request.param("Type"), Some("Log"));
        assert_eq!(request.param("Param2"), Some("20"));
        assert!(request.body().is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn decodes_form_body_params() {
        let mut buffer = BytesMut::from(
            "POST /monitor?Type=CPU HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded; charset=utf-8\r\nContent-Length: 22\r\n\r\nType=Objects&Param1=io",
        );

        let request = RequestDecoder::new().decode(&mut buffer).unwrap().unwrap();
        assert_eq!(request.param("Type"), Some("Objects"));
        assert_eq!(request.param("Param1"), Some("io"));
        assert_eq!(&request.body()[..], b"Type=Objects&Param1=io");
    }

    #[test]
    fn non_form_body_is_not_parsed() {
        let mut buffer =
            BytesMut::from("PUT /data HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 7\r\n\r\n{\"a\":1}");

        let request = RequestDecoder::new().decode(&mut buffer).unwrap().unwrap();
        assert!(request.params().is_empty());
        assert_eq!(&request.body()[..], b"{\"a\":1}");
    }

    #[test]
    fn pipelined_requests() {
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::from("GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n");

        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap().path(), "/a");
        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap().path(), "/b");
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn truncated_request_body_at_eof() {
        let mut buffer = BytesMut::from("POST /upload HTTP/1.1\r\nContent-Length: 8\r\n\r\nabc");
        let result = RequestDecoder::new().decode_eof(&mut buffer);
        assert!(matches!(result, Err(DecodeError::TruncatedBody { expected: 8, received: 3 })));
    }

    #[test]
    fn oversized_content_length_is_rejected_with_the_head() {
        let mut buffer = BytesMut::from("POST /x HTTP/1.1\r\nContent-Length: 1000000000000\r\n\r\n");
        let result = RequestDecoder::new().decode(&mut buffer);
        assert!(matches!(
            result,
            Err(DecodeError::TooLargeBody { size: 1_000_000_000_000, max_size: MAX_BODY_BYTES })
        ));
    }

    #[test]
    fn content_length_at_limit_is_accepted() {
        let head = format!("POST /x HTTP/1.1\r\nContent-Length: {MAX_BODY_BYTES}\r\n\r\n");
        let mut buffer = BytesMut::from(head.as_str());
        assert!(RequestDecoder::new().decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn oversized_chunked_body_is_rejected() {
        let mut decoder = RequestDecoder::new();
        let mut buffer = BytesMut::from("POST /x HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n");
        assert!(decoder.decode(&mut buffer).unwrap().is_none());

        let chunk = vec![b'a'; 1024 * 1024];
        let mut result = Ok(None);
        for _ in 0..64 {
            buffer.extend_from_slice(b"100000\r\n");
            buffer.extend_from_slice(&chunk);
            buffer.extend_from_slice(b"\r\n");
            result = decoder.decode(&mut buffer);
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(DecodeError::TooLargeBody { max_size: MAX_BODY_BYTES, .. })));
    }
}
