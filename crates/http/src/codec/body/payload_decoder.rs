//! Decoder implementation for HTTP message payloads.
//!
//! This module provides a unified decoder for the different ways a body can be framed:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//! - Payloads delimited by the end of the stream
//! - Messages with no body
//!
//! The strategy is picked from the [`PayloadSize`] computed by the header decoders.

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::protocol::{DecodeError, PayloadSize};
use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

/// A unified decoder for HTTP message payloads.
///
/// Every strategy yields the complete body as a single `Bytes` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadDecoder {
    /// The specific decoding strategy to use
    kind: Kind,
}

/// Enum representing different payload decoding strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Collect everything until the peer closes the stream
    UntilClose,

    /// Handle messages with no body
    NoBody,
}

impl PayloadDecoder {
    /// Creates a PayloadDecoder for messages with no body.
    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    /// Creates a PayloadDecoder for chunked transfer encoding.
    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    /// Creates a PayloadDecoder for chunked transfer encoding that rejects bodies over `limit` bytes.
    pub fn chunked_with_limit(limit: u64) -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::with_limit(limit)) }
    }

    /// Creates a PayloadDecoder for a fixed-length payload.
    pub fn fix_length(size: u64) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size)) }
    }

    /// Creates a PayloadDecoder that reads until end of stream.
    pub fn until_close() -> Self {
        Self { kind: Kind::UntilClose }
    }

    /// Returns whether this decoder handles chunked transfer encoding.
    pub fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    /// Returns whether this decoder handles messages with no body.
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, Kind::NoBody)
    }
}

impl From<PayloadSize> for PayloadDecoder {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(length) => Self::fix_length(length),
            PayloadSize::Chunked => Self::chunked(),
            PayloadSize::UntilClose => Self::until_close(),
            PayloadSize::Empty => Self::empty(),
        }
    }
}

/// Delegates to the appropriate decoder based on the payload type.
impl Decoder for PayloadDecoder {
    type Item = Bytes;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(src),
            // the body is only known to be complete at end of stream
            Kind::UntilClose => Ok(None),
            Kind::NoBody => Ok(Some(Bytes::new())),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode_eof(src),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode_eof(src),
            Kind::UntilClose => Ok(Some(src.split().freeze())),
            Kind::NoBody => Ok(Some(Bytes::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_strategy_from_payload_size() {
        assert!(PayloadDecoder::from(PayloadSize::Chunked).is_chunked());
        assert!(PayloadDecoder::from(PayloadSize::Empty).is_empty());
        assert!(!PayloadDecoder::from(PayloadSize::Length(3)).is_empty());
    }

    #[test]
    fn until_close_waits_for_eof() {
        let mut decoder = PayloadDecoder::until_close();
        let mut buffer = BytesMut::from("<html>partial");

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert_eq!(buffer.len(), 13);

        buffer.extend_from_slice(b" page</html>");
        let body = decoder.decode_eof(&mut buffer).unwrap().unwrap();
        assert_eq!(&body[..], b"<html>partial page</html>");
        assert!(buffer.is_empty());
    }

    #[test]
    fn no_body_leaves_buffer_untouched() {
        let mut decoder = PayloadDecoder::empty();
        let mut buffer = BytesMut::from("GET / HTTP/1.1\r\n");

        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_empty());
        assert_eq!(buffer.len(), 16);
    }

    #[test]
    fn length_delegates() {
        let mut decoder = PayloadDecoder::fix_length(4);
        let mut buffer = BytesMut::from("abcdef");
        assert_eq!(&decoder.decode(&mut buffer).unwrap().unwrap()[..], b"abcd");
        assert_eq!(&buffer[..], b"ef");
    }
}
