//! HTTP message model shared by the codec and the layers above it.
//!
//! - [`HttpRequest`] / [`RequestBuilder`]: start line, headers, parameters and body
//! - [`HttpResponse`]: status, reason phrase, headers and body
//! - [`Params`]: query and form parameters
//! - [`PayloadSize`]: how a body is framed on the wire
//! - [`HttpError`], [`DecodeError`], [`EncodeError`]: error types
//!
//! Header lookups go through `http::HeaderMap`, so names always compare
//! case-insensitively.

mod payload;
pub use payload::PayloadSize;

mod params;
pub use params::Params;

mod request;
pub(crate) use request::method_allows_body;
pub use request::HttpRequest;
pub use request::RequestBuilder;

mod response;
pub(crate) use response::status_forbids_body;
pub use response::HttpResponse;

mod error;
pub use error::DecodeError;
pub use error::EncodeError;
pub use error::HttpError;
