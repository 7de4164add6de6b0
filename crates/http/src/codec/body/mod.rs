//! HTTP body decoding.
//!
//! The codec works on complete messages, so each decoder here waits until the
//! whole body is buffered and then yields it as one `Bytes` value.
//!
//! - [`LengthDecoder`]: `Content-Length` framed bodies
//! - [`ChunkedDecoder`]: `Transfer-Encoding: chunked` bodies
//! - [`PayloadDecoder`]: picks the strategy from a [`PayloadSize`](crate::protocol::PayloadSize)

mod chunked_decoder;
mod length_decoder;
mod payload_decoder;

pub use payload_decoder::PayloadDecoder;
