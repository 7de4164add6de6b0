//! HTTP response encoder, used by the server role.
//!
//! The status line uses the response's stored reason phrase, or the canonical
//! one. Responses whose status forbids a body (1xx, 204, 304) are written
//! without body and without `Content-Length`; every other response is framed
//! with a `Content-Length` matching the body.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::{trace, warn};

use crate::codec::header::encode_response_head;
use crate::protocol::{EncodeError, HttpResponse};

/// An encoder for complete HTTP responses; holds no state between messages.
#[derive(Debug, Default)]
pub struct ResponseEncoder;

impl ResponseEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<HttpResponse> for ResponseEncoder {
    type Error = EncodeError;

    fn encode(&mut self, item: HttpResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bodiless = item.is_bodiless();
        if bodiless && !item.body().is_empty() {
            warn!(status = item.status().as_u16(), body_size = item.body().len(), "dropping body of bodiless response");
        }

        let content_length = (!bodiless).then_some(item.body().len() as u64);
        trace!(status = item.status().as_u16(), ?content_length, "encoding response");

        encode_response_head(item.status(), item.status_text(), item.version(), item.headers(), content_length, dst)?;
        if !bodiless {
            dst.put_slice(item.body());
        }
        Ok(())
    }
}
