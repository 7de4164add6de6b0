//! Decoder implementation for HTTP chunked transfer encoding.
//!
//! [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1).
//!
//! Chunk size lines (including extensions) are parsed by
//! `httparse::parse_chunk_size`; chunk data is appended to an internal buffer
//! until the last chunk and the trailer section have been read.
//!
//! A decoder built with [`ChunkedDecoder::with_limit`] fails as soon as the
//! announced chunk sizes would take the body past the limit. Size lines and
//! the trailer section are bounded like a header section.

use std::cmp;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::header::MAX_HEADER_BYTES;
use crate::ensure;
use crate::protocol::DecodeError;
use ChunkedState::{DataCrlf, Data, End, Size, Trailer};

/// A decoder for `Transfer-Encoding: chunked` bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedDecoder {
    state: ChunkedState,
    body: BytesMut,
    limit: u64,
    trailer_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size line
    Size,
    /// Read chunk data
    Data { remaining: u64 },
    /// Read CRLF after chunk data
    DataCrlf,
    /// Read trailer fields up to the empty line
    Trailer,
    /// The whole body has been read
    End,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        Self::with_limit(u64::MAX)
    }

    /// Rejects bodies larger than `limit` bytes with [`DecodeError::TooLargeBody`].
    pub fn with_limit(limit: u64) -> Self {
        Self { state: Size, body: BytesMut::new(), limit, trailer_len: 0 }
    }

    /// Number of body bytes collected so far.
    pub fn received(&self) -> usize {
        self.body.len()
    }
}

impl Default for ChunkedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ChunkedDecoder {
    type Item = Bytes;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                Size => match httparse::parse_chunk_size(src) {
                    Ok(httparse::Status::Complete((consumed, size))) => {
                        trace!(chunk_size = size, "read chunk size");
                        let total = (self.body.len() as u64).saturating_add(size);
                        ensure!(total <= self.limit, DecodeError::too_large_body(total, self.limit));
                        src.advance(consumed);
                        self.state = if size == 0 { Trailer } else { Data { remaining: size } };
                    }
                    Ok(httparse::Status::Partial) => {
                        ensure!(src.len() <= MAX_HEADER_BYTES, DecodeError::invalid_chunk("chunk size line too long"));
                        return Ok(None);
                    }
                    Err(_) => return Err(DecodeError::invalid_chunk("invalid chunk size line")),
                },

                Data { remaining } => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    #[allow(clippy::cast_possible_truncation, reason = "bounded by the buffer length")]
                    let len = cmp::min(remaining, src.len() as u64) as usize;
                    self.body.extend_from_slice(&src[..len]);
                    src.advance(len);

                    let remaining = remaining - len as u64;
                    self.state = if remaining == 0 { DataCrlf } else { Data { remaining } };
                }

                DataCrlf => {
                    if src.len() < 2 {
                        return Ok(None);
                    }
                    ensure!(&src[..2] == b"\r\n", DecodeError::invalid_chunk("missing CRLF after chunk data"));
                    src.advance(2);
                    self.state = Size;
                }

                Trailer => {
                    let Some(line_end) = src.windows(2).position(|w| w == b"\r\n") else {
                        let pending = self.trailer_len + src.len();
                        ensure!(pending <= MAX_HEADER_BYTES, DecodeError::too_large_header(pending, MAX_HEADER_BYTES));
                        return Ok(None);
                    };
                    self.trailer_len += line_end + 2;
                    ensure!(
                        self.trailer_len <= MAX_HEADER_BYTES,
                        DecodeError::too_large_header(self.trailer_len, MAX_HEADER_BYTES)
                    );
                    src.advance(line_end + 2);
                    // an empty line terminates the trailer section
                    if line_end == 0 {
                        self.state = End;
                    }
                }

                End => {
                    trace!(body_size = self.body.len(), "finished reading chunked data");
                    return Ok(Some(std::mem::take(&mut self.body).freeze()));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(body) => Ok(Some(body)),
            None => Err(DecodeError::TruncatedChunkedBody { received: self.body.len() }),
        }
    }
}
