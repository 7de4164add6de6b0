//! HTTP/1.x message model and codec for the strand framework.
//!
//! This crate is the protocol boundary between a bidirectional byte stream
//! and structured HTTP messages. It never opens sockets itself: the codecs
//! implement `tokio_util::codec::{Encoder, Decoder}` and the connection types
//! run on top of any `AsyncRead + AsyncWrite` transport.
//!
//! # Example
//!
//! ```no_run
//! use std::error::Error;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//! use strand_http::connection::ServerConnection;
//! use strand_http::handler::make_handler;
//! use strand_http::protocol::{HttpRequest, HttpResponse};
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = ServerConnection::new(reader, writer);
//!             if let Err(e) = connection.process(handler).await {
//!                 error!("service has error, cause {}, connection shutdown", e);
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: HttpRequest) -> Result<HttpResponse, Box<dyn Error + Send + Sync>> {
//!     info!(path = request.path(), "receiving request");
//!     Ok(HttpResponse::ok("Hello World!\r\n"))
//! }
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: requests, responses, parameters and error types
//! - [`codec`]: the client and server codecs plus one-shot encode/decode helpers
//! - [`connection`]: client and server sessions over framed byte streams
//! - [`handler`]: the request handler trait used by server sessions
//!
//! Bodies are handled as complete buffers: a decoder yields a message only
//! once its whole body has arrived (`Content-Length`, chunked, or until the
//! stream closes for responses without framing headers).
//!
//! # Limitations
//!
//! - HTTP/1.0 and HTTP/1.1 only
//! - No TLS support
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64
//! - Maximum request body size: 8MB

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
