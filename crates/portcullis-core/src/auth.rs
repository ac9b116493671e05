//! The authentication capability consumed by the gate.

use async_trait::async_trait;
use std::sync::Arc;

/// Decides whether a request is authenticated.
///
/// Implementations are shared across concurrent requests and must not keep
/// per-request state the gate could observe. An `Err` means the service could
/// not decide at all; the gate passes it through untouched.
#[async_trait]
pub trait AuthService<Req: Sync + ?Sized>: Send + Sync {
    /// Failure to produce an answer.
    type Error: Send;

    /// Check whether `req` is authenticated.
    async fn is_request_authenticated(&self, req: &Req) -> Result<bool, Self::Error>;
}

#[async_trait]
impl<Req, A> AuthService<Req> for Arc<A>
where
    Req: Sync + ?Sized,
    A: AuthService<Req> + ?Sized,
{
    type Error = A::Error;

    async fn is_request_authenticated(&self, req: &Req) -> Result<bool, Self::Error> {
        (**self).is_request_authenticated(req).await
    }
}
