//! HTTP sessions over byte streams.
//!
//! Adapts the codec to any `AsyncRead + AsyncWrite` transport through
//! `tokio_util::codec` framing.
//!
//! - [`ClientConnection`]: sends a request and waits for the complete response
//! - [`ServerConnection`]: reads requests, dispatches them to a
//!   [`Handler`](crate::handler::Handler) and writes the responses back

mod client_connection;
mod server_connection;

pub use client_connection::ClientConnection;
pub use server_connection::ServerConnection;
