//! HTTP head processing for both message directions.
//!
//! - [`RequestHeaderDecoder`] / [`ResponseHeaderDecoder`]: parse a start line and
//!   header fields from raw bytes and decide how the body is framed
//! - [`encode_request_head`] / [`encode_response_head`]: serialize a start line
//!   and header fields, owning the framing headers

mod header_decoder;
mod header_encoder;

pub(crate) use header_decoder::MAX_BODY_BYTES;
pub(crate) use header_decoder::MAX_HEADER_BYTES;
pub use header_decoder::RequestHeaderDecoder;
pub use header_decoder::ResponseHeadParts;
pub use header_decoder::ResponseHeaderDecoder;
pub use header_encoder::encode_request_head;
pub use header_encoder::encode_response_head;
