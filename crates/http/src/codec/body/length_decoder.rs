//! Decoder implementation for HTTP messages with Content-Length header.
//!
//! [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).

use crate::protocol::DecodeError;
use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

/// A decoder for bodies with a known content length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthDecoder {
    length: u64,
}

impl LengthDecoder {
    pub fn new(length: u64) -> Self {
        Self { length }
    }

    pub fn length(&self) -> u64 {
        self.length
    }
}

impl Decoder for LengthDecoder {
    type Item = Bytes;
    type Error = DecodeError;

    /// Yields the body once `length` bytes are buffered, leaving any following bytes in `src`.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if (src.len() as u64) < self.length {
            return Ok(None);
        }

        #[allow(clippy::cast_possible_truncation, reason = "bounded by the buffer length")]
        let body = src.split_to(self.length as usize).freeze();
        Ok(Some(body))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(body) => Ok(Some(body)),
            None => Err(DecodeError::truncated_body(self.length, src.len() as u64)),
        }
    }
}
