use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::trace;

use crate::codec::ClientCodec;
use crate::protocol::{HttpError, HttpRequest, HttpResponse};

/// Client side of an HTTP session over any byte stream.
///
/// Each [`send`](ClientConnection::send) writes one request and waits for the
/// complete response. The stream is left open between exchanges.
pub struct ClientConnection<T> {
    framed: Framed<T, ClientCodec>,
}

impl<T> ClientConnection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: T) -> Self {
        Self { framed: Framed::new(io, ClientCodec::new()) }
    }

    pub async fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        trace!(method = %request.method(), uri = %request.uri(), "sending request");
        self.framed.send(request).await?;

        match self.framed.next().await {
            Some(response) => Ok(response?),
            None => Err(HttpError::ConnectionClosed),
        }
    }

    /// Releases the underlying stream; bytes already buffered are discarded.
    pub fn into_inner(self) -> T {
        self.framed.into_inner()
    }
}
