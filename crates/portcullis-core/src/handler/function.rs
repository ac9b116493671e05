//! Plain callable handlers.

use super::{Convention, Handler, HandlerMeta, HandlerShape, Invocation};
use crate::exemption::{Exemption, MarkExempt};
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type Call<Req, R, E> = dyn Fn(Req) -> Invocation<Result<R, E>> + Send + Sync;

/// A handler backed by a free function or closure.
///
/// Carries the exemption marker in place, so marking it returns the same
/// handler with the same [`HandlerId`](super::HandlerId).
pub struct Function<Req, R, E> {
    call: Arc<Call<Req, R, E>>,
    meta: HandlerMeta,
    exempt: bool,
}

impl<Req, R, E> Function<Req, R, E>
where
    Req: 'static,
    R: 'static,
    E: 'static,
{
    /// Create a handler from a synchronous function.
    pub fn sync<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Req) -> Result<R, E> + Send + Sync + 'static,
    {
        Self {
            call: Arc::new(move |req: Req| Invocation::ready(f(req))),
            meta: HandlerMeta::new(name, Convention::Synchronous),
            exempt: false,
        }
    }

    /// Create a handler from an async function.
    pub fn suspending<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        Self {
            call: Arc::new(move |req: Req| Invocation::suspended(f(req))),
            meta: HandlerMeta::new(name, Convention::Suspending),
            exempt: false,
        }
    }
}

impl<Req, R, E> Function<Req, R, E> {
    /// Attach documentation for diagnostics.
    pub fn with_doc(mut self, doc: impl Into<Cow<'static, str>>) -> Self {
        self.meta = self.meta.with_doc(doc);
        self
    }
}

impl<Req, R, E> Clone for Function<Req, R, E> {
    fn clone(&self) -> Self {
        Self {
            call: self.call.clone(),
            meta: self.meta.clone(),
            exempt: self.exempt,
        }
    }
}

impl<Req, R, E> fmt::Debug for Function<Req, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("meta", &self.meta)
            .field("exempt", &self.exempt)
            .finish()
    }
}

impl<Req, R, E> Exemption for Function<Req, R, E> {
    fn is_authentication_exempt(&self) -> bool {
        self.exempt
    }
}

impl<Req, R, E> MarkExempt for Function<Req, R, E> {
    type Marked = Self;

    fn authentication_exempt(mut self) -> Self {
        self.exempt = true;
        self
    }
}

impl<Req, R, E> Handler<Req> for Function<Req, R, E> {
    type Response = R;
    type Error = E;

    fn call(&self, req: Req) -> Invocation<Result<R, E>> {
        (self.call)(req)
    }

    fn meta(&self) -> &HandlerMeta {
        &self.meta
    }

    fn shape(&self) -> HandlerShape {
        HandlerShape::Function
    }
}
