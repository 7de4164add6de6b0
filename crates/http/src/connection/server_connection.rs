use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use http::{StatusCode, Version, header};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info, trace};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::{HttpError, HttpRequest, HttpResponse};

/// Server side of an HTTP session.
///
/// Reads complete requests from `R`, hands each to a [`Handler`] and writes
/// the response to `W`, until the peer closes the stream or asks for the
/// connection to be closed.
///
/// - a request that fails to decode is answered with `400 Bad Request` and ends the session
/// - a handler error is logged and answered with `500 Internal Server Error`
pub struct ServerConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> ServerConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder::new(), 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder::new()),
        }
    }

    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(request)) => {
                    let close = wants_close(&request);
                    trace!(method = %request.method(), path = request.path(), "received request");

                    let response = match handler.call(request).await {
                        Ok(response) => response,
                        Err(e) => {
                            error!("handle response error, cause: {}", e.into());
                            HttpResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
                        }
                    };
                    self.framed_write.send(response).await?;

                    if close {
                        info!("peer asked to close, connection shutdown");
                        return Ok(());
                    }
                }

                Some(Err(e)) => {
                    error!("can't receive next request, cause {}", e);
                    self.framed_write.send(HttpResponse::new(StatusCode::BAD_REQUEST)).await?;
                    return Err(e.into());
                }

                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
            }
        }
    }
}

/// HTTP/1.1 keeps the connection unless told otherwise, HTTP/1.0 closes it unless told otherwise.
fn wants_close(request: &HttpRequest) -> bool {
    let connection = request.headers().get(header::CONNECTION).map(|value| value.as_bytes());
    match request.version() {
        Version::HTTP_10 => !connection.is_some_and(|value| value.eq_ignore_ascii_case(b"keep-alive")),
        _ => connection.is_some_and(|value| value.eq_ignore_ascii_case(b"close")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ClientConnection;
    use crate::handler::make_handler;
    use crate::protocol::DecodeError;
    use std::io;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn echo_path(request: HttpRequest) -> Result<HttpResponse, io::Error> {
        if request.path() == "/fail" {
            return Err(io::Error::other("handler failed"));
        }
        Ok(HttpResponse::ok(request.path().to_owned()))
    }

    #[tokio::test]
    async fn serves_requests_until_peer_closes() {
        let (client_io, server_io) = tokio::io::duplex(4096);
        let (reader, writer) = tokio::io::split(server_io);
        let server = tokio::spawn(ServerConnection::new(reader, writer).process(Arc::new(make_handler(echo_path))));

        let mut client = ClientConnection::new(client_io);
        let first = client.send(HttpRequest::get("/a.txt").build().unwrap()).await.unwrap();
        assert_eq!(&first.body()[..], b"/a.txt");

        let failed = client.send(HttpRequest::get("/fail").build().unwrap()).await.unwrap();
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);

        drop(client);
        assert!(server.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn malformed_request_gets_bad_request() {
        let (mut client_io, server_io) = tokio::io::duplex(4096);
        let (reader, writer) = tokio::io::split(server_io);
        let server = tokio::spawn(ServerConnection::new(reader, writer).process(Arc::new(make_handler(echo_path))));

        client_io.write_all(b"GET /a HTTP/1.1\r\nbad header\r\n\r\n").await.unwrap();
        let mut received = Vec::new();
        client_io.read_to_end(&mut received).await.unwrap();

        assert!(received.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
        assert!(server.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn connection_close_ends_session() {
        let (client_io, server_io) = tokio::io::duplex(4096);
        let (reader, writer) = tokio::io::split(server_io);
        let server = tokio::spawn(ServerConnection::new(reader, writer).process(Arc::new(make_handler(echo_path))));

        let mut client = ClientConnection::new(client_io);
        let request = HttpRequest::get("/bye").header("Connection", "close").build().unwrap();
        assert_eq!(&client.send(request).await.unwrap().body()[..], b"/bye");

        assert!(server.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn oversized_body_gets_bad_request() {
        let (mut client_io, server_io) = tokio::io::duplex(4096);
        let (reader, writer) = tokio::io::split(server_io);
        let server = tokio::spawn(ServerConnection::new(reader, writer).process(Arc::new(make_handler(echo_path))));

        client_io.write_all(b"POST /upload HTTP/1.1\r\nContent-Length: 1000000000000\r\n\r\n").await.unwrap();
        let mut received = Vec::new();
        client_io.read_to_end(&mut received).await.unwrap();

        assert!(received.starts_with(b"HTTP/1.1 400 Bad Request\r\n"));
        assert!(matches!(server.await.unwrap(), Err(HttpError::DecodeError { source: DecodeError::TooLargeBody { .. } })));
    }
}
