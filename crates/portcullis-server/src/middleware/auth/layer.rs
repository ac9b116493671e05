//! Authentication-required middleware layer.

use super::service::HandlerService;
use crate::error::ApiError;
use axum::{
    extract::Request,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use portcullis_core::{AuthService, AuthenticationRequired, Exemption, Rejection};
use portcullis_log::spans::{gate_span, record_decision};
use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;

/// Layer enforcing authentication on every wrapped handler that is not
/// authentication exempt.
///
/// The wrapped service must report its exemption, which [`HandlerService`]
/// does. The authentication service sees the request head only; the body is
/// untouched until the handler runs.
pub struct AuthRequiredLayer<A: ?Sized> {
    gate: AuthenticationRequired<A>,
}

impl<A: ?Sized> AuthRequiredLayer<A> {
    /// Create new auth layer.
    pub fn new(auth: Arc<A>) -> Self {
        Self {
            gate: AuthenticationRequired::new(auth),
        }
    }

    /// Wrap a handler into a gated route service.
    pub fn endpoint<H>(&self, handler: H) -> AuthRequiredMiddleware<HandlerService<H>, A> {
        self.layer(HandlerService::new(handler))
    }
}

impl<A: ?Sized> Clone for AuthRequiredLayer<A> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
        }
    }
}

impl<S, A: ?Sized> Layer<S> for AuthRequiredLayer<A> {
    type Service = AuthRequiredMiddleware<S, A>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthRequiredMiddleware {
            inner,
            gate: self.gate.clone(),
        }
    }
}

/// Authentication-required middleware service.
pub struct AuthRequiredMiddleware<S, A: ?Sized> {
    inner: S,
    gate: AuthenticationRequired<A>,
}

impl<S: Clone, A: ?Sized> Clone for AuthRequiredMiddleware<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl<S, A> Service<Request> for AuthRequiredMiddleware<S, A>
where
    S: Service<Request, Response = Response, Error = Infallible>
        + Exemption
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
    A: AuthService<Parts> + ?Sized + 'static,
    A::Error: Into<ApiError>,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let gate = self.gate.clone();
        // Keep the service that was polled ready, leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let span = gate_span(req.method().as_str(), req.uri().path());

        Box::pin(
            async move {
                let (parts, body) = req.into_parts();

                match gate.authorize(&parts, &inner).await {
                    Ok(decision) => {
                        record_decision(&decision);
                        inner.call(Request::from_parts(parts, body)).await
                    }
                    Err(Rejection::Unauthorized) => Ok(ApiError::Unauthorized.into_response()),
                    Err(Rejection::AuthService(err)) => {
                        let err: ApiError = err.into();
                        Ok(err.into_response())
                    }
                }
            }
            .instrument(span),
        )
    }
}
