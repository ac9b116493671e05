//! Tower service around a gate handler.

use axum::{
    extract::Request,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use portcullis_core::{Exemption, Handler};
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// Serves requests by invoking a [`Handler`].
///
/// Handler errors are rendered through their `IntoResponse` impl, so the
/// service itself never fails. The handler's exemption marker is visible to
/// [`AuthRequiredMiddleware`](super::AuthRequiredMiddleware).
pub struct HandlerService<H> {
    handler: Arc<H>,
}

impl<H> HandlerService<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl<H> Clone for HandlerService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl<H: Exemption> Exemption for HandlerService<H> {
    fn is_authentication_exempt(&self) -> bool {
        self.handler.is_authentication_exempt()
    }
}

impl<H> fmt::Debug for HandlerService<H>
where
    H: Handler<Request>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerService")
            .field("handler", self.handler.meta())
            .finish()
    }
}

impl<H> Service<Request> for HandlerService<H>
where
    H: Handler<Request> + 'static,
    H::Response: IntoResponse + Send + 'static,
    H::Error: IntoResponse + Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let invocation = self.handler.call(req);

        Box::pin(async move {
            let response = match invocation.await {
                Ok(response) => response.into_response(),
                Err(err) => err.into_response(),
            };
            Ok(response)
        })
    }
}
