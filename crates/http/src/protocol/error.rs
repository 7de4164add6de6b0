use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("decode error: {source}")]
    DecodeError {
        #[from]
        source: DecodeError,
    },

    #[error("encode error: {source}")]
    EncodeError {
        #[from]
        source: EncodeError,
    },

    #[error("connection closed before a complete message was received")]
    ConnectionClosed,
}

/// Errors raised while turning wire bytes into a message.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("body size too large, declared or received: {size} exceed the limit {max_size}")]
    TooLargeBody { size: u64, max_size: u64 },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid status line: {reason}")]
    InvalidStatusLine { reason: String },

    #[error("invalid status code: {0}")]
    InvalidStatus(u16),

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid chunked body: {reason}")]
    InvalidChunk { reason: String },

    #[error("invalid parameters: {reason}")]
    InvalidParams { reason: String },

    #[error("empty message")]
    EmptyMessage,

    #[error("header section is not terminated, received {received} bytes")]
    UnterminatedHeader { received: usize },

    #[error("body truncated, expected {expected} bytes but received {received}")]
    TruncatedBody { expected: u64, received: u64 },

    #[error("chunked body truncated after {received} bytes")]
    TruncatedChunkedBody { received: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl DecodeError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_large_body(size: u64, max_size: u64) -> Self {
        Self::TooLargeBody { size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_status_line<S: ToString>(str: S) -> Self {
        Self::InvalidStatusLine { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn invalid_chunk<S: ToString>(str: S) -> Self {
        Self::InvalidChunk { reason: str.to_string() }
    }

    pub fn invalid_params<S: ToString>(str: S) -> Self {
        Self::InvalidParams { reason: str.to_string() }
    }

    pub fn unterminated_header(received: usize) -> Self {
        Self::UnterminatedHeader { received }
    }

    pub fn truncated_body(expected: u64, received: u64) -> Self {
        Self::TruncatedBody { expected, received }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Errors raised while writing a message to wire bytes.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("unsupported http version: {0:?}")]
    UnsupportedVersion(http::Version),

    #[error("invalid parameters: {reason}")]
    InvalidParams { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl EncodeError {
    pub fn invalid_params<S: ToString>(str: S) -> Self {
        Self::InvalidParams { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
