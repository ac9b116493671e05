//! Handler model: one invocation interface for every calling convention.
//!
//! - [`Function`]: plain callables, synchronous or suspending
//! - [`Method`]: callables bound to a receiver, synchronous or suspending
//! - [`Exempt`](crate::Exempt): forwarding wrapper that carries the exemption
//!   marker for handlers that cannot carry it themselves

mod function;
mod invocation;
mod meta;
mod method;

pub use function::Function;
pub use invocation::Invocation;
pub use meta::{Convention, HandlerId, HandlerMeta, HandlerShape};
pub use method::Method;

use crate::exemption::Exemption;
use std::sync::Arc;

/// A request handler as seen by the authentication gate.
pub trait Handler<Req>: Exemption + Send + Sync {
    /// Successful result.
    type Response;
    /// Failure result.
    type Error;

    /// Invoke the handler.
    fn call(&self, req: Req) -> Invocation<Result<Self::Response, Self::Error>>;

    /// Identity and diagnostics.
    fn meta(&self) -> &HandlerMeta;

    /// Structural kind of this handler.
    fn shape(&self) -> HandlerShape {
        HandlerShape::Opaque
    }
}

/// Type-erased handler for dynamically assembled routing tables.
pub type BoxHandler<Req, R, E> = Arc<dyn Handler<Req, Response = R, Error = E>>;

impl<Req, H> Handler<Req> for Arc<H>
where
    H: Handler<Req> + ?Sized,
{
    type Response = H::Response;
    type Error = H::Error;

    fn call(&self, req: Req) -> Invocation<Result<Self::Response, Self::Error>> {
        (**self).call(req)
    }

    fn meta(&self) -> &HandlerMeta {
        (**self).meta()
    }

    fn shape(&self) -> HandlerShape {
        (**self).shape()
    }
}

impl<Req, H> Handler<Req> for Box<H>
where
    H: Handler<Req> + ?Sized,
{
    type Response = H::Response;
    type Error = H::Error;

    fn call(&self, req: Req) -> Invocation<Result<Self::Response, Self::Error>> {
        (**self).call(req)
    }

    fn meta(&self) -> &HandlerMeta {
        (**self).meta()
    }

    fn shape(&self) -> HandlerShape {
        (**self).shape()
    }
}
