//! Authentication exemption marker.
//!
//! Exemption is decided when a handler is defined, before any router sees it.
//! Plain functions store the marker on themselves. Bound methods cannot, so
//! marking one wraps it in an [`Exempt`] forwarder that stores the marker and
//! otherwise behaves exactly like the method.

use crate::error::ExemptionError;
use crate::handler::{BoxHandler, Handler, HandlerMeta, HandlerShape, Invocation};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Read access to the exemption marker.
///
/// The default reports "not exempt", which is also the answer for any type
/// that has nowhere to store the marker.
pub trait Exemption {
    /// Whether requests for this handler skip the authentication check.
    fn is_authentication_exempt(&self) -> bool {
        false
    }
}

impl<T: Exemption + ?Sized> Exemption for Arc<T> {
    fn is_authentication_exempt(&self) -> bool {
        (**self).is_authentication_exempt()
    }
}

impl<T: Exemption + ?Sized> Exemption for Box<T> {
    fn is_authentication_exempt(&self) -> bool {
        (**self).is_authentication_exempt()
    }
}

impl<T: Exemption + ?Sized> Exemption for &T {
    fn is_authentication_exempt(&self) -> bool {
        (**self).is_authentication_exempt()
    }
}

/// Handler shapes that can be marked authentication exempt.
///
/// Only handler kinds with a known way to carry the marker implement this, so
/// marking anything else fails to compile.
pub trait MarkExempt: Sized {
    /// The handler identity that reports exempt.
    type Marked: Exemption;

    /// Mark this handler as not requiring authentication.
    ///
    /// Repeated marking is harmless: the result always reports exempt.
    fn authentication_exempt(self) -> Self::Marked;
}

/// Return true if the handler is authentication exempt.
pub fn is_handler_authentication_exempt<H: Exemption + ?Sized>(handler: &H) -> bool {
    handler.is_authentication_exempt()
}

/// Forwarding wrapper that carries the exemption marker for another handler.
///
/// Calls go straight to the inner handler and return its invocation as is: a
/// synchronous handler stays synchronous and a suspending one suspends exactly
/// where it would have without the wrapper. Name, documentation and calling
/// convention are copied from the inner handler; the identity is new.
pub struct Exempt<H> {
    inner: H,
    meta: HandlerMeta,
}

impl<H> Exempt<H> {
    pub(crate) fn with_meta(inner: H, meta: HandlerMeta) -> Self {
        Self { inner, meta }
    }

    /// Unwrap, discarding the marker.
    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: Clone> Clone for Exempt<H> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            meta: self.meta.clone(),
        }
    }
}

impl<H: fmt::Debug> fmt::Debug for Exempt<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exempt")
            .field("meta", &self.meta)
            .field("inner", &self.inner)
            .finish()
    }
}

impl<H> Exemption for Exempt<H> {
    fn is_authentication_exempt(&self) -> bool {
        true
    }
}

impl<H> MarkExempt for Exempt<H> {
    type Marked = Self;

    fn authentication_exempt(self) -> Self {
        self
    }
}

impl<Req, H> Handler<Req> for Exempt<H>
where
    H: Handler<Req>,
{
    type Response = H::Response;
    type Error = H::Error;

    fn call(&self, req: Req) -> Invocation<Result<Self::Response, Self::Error>> {
        self.inner.call(req)
    }

    fn meta(&self) -> &HandlerMeta {
        &self.meta
    }

    fn shape(&self) -> HandlerShape {
        HandlerShape::Forwarder
    }
}

/// Mark a type-erased handler as authentication exempt.
///
/// A shared handler cannot be modified in place, so functions and bound
/// methods are wrapped in [`Exempt`]. Forwarders that already report exempt
/// are returned unchanged. Any other handler, including a forwarder that does
/// not report exempt, is a registration error.
pub fn exempt_boxed<Req, R, E>(
    handler: BoxHandler<Req, R, E>,
) -> Result<BoxHandler<Req, R, E>, ExemptionError>
where
    Req: 'static,
    R: 'static,
    E: 'static,
{
    match handler.shape() {
        HandlerShape::Forwarder if handler.is_authentication_exempt() => Ok(handler),
        HandlerShape::Function | HandlerShape::BoundMethod => {
            debug!(
                handler = %handler.meta().name(),
                id = %handler.meta().id(),
                "Wrapping handler as authentication exempt"
            );
            let meta = handler.meta().rebind();
            Ok(Arc::new(Exempt::with_meta(handler, meta)))
        }
        HandlerShape::Forwarder | HandlerShape::Opaque => {
            Err(ExemptionError::UnsupportedHandlerShape {
                name: handler.meta().name().to_string(),
            })
        }
    }
}
