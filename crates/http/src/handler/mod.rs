//! Request handler abstraction used by [`ServerConnection`](crate::connection::ServerConnection).
//!
//! A [`Handler`] turns one complete [`HttpRequest`] into one [`HttpResponse`].
//! Plain async functions are adapted with [`make_handler`].

use std::error::Error;
use std::future::Future;

use async_trait::async_trait;

use crate::protocol::{HttpRequest, HttpResponse};

#[async_trait]
pub trait Handler: Send + Sync {
    type Error: Into<Box<dyn Error + Send + Sync>> + Send;

    async fn call(&self, req: HttpRequest) -> Result<HttpResponse, Self::Error>;
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<Err, F, Fut> Handler for HandlerFn<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>> + Send,
    Fut: Future<Output = Result<HttpResponse, Err>> + Send,
{
    type Error = Err;

    async fn call(&self, req: HttpRequest) -> Result<HttpResponse, Self::Error> {
        (self.f)(req).await
    }
}

pub fn make_handler<F, Err, Ret>(f: F) -> HandlerFn<F>
where
    Err: Into<Box<dyn Error + Send + Sync>>,
    Ret: Future<Output = Result<HttpResponse, Err>>,
    F: Fn(HttpRequest) -> Ret,
{
    HandlerFn { f }
}
