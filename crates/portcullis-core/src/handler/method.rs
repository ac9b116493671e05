//! Handlers bound to a receiver.

use super::{Convention, Handler, HandlerMeta, HandlerShape, Invocation};
use crate::exemption::{Exempt, Exemption, MarkExempt};
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type Call<T, Req, R, E> = dyn Fn(&Arc<T>, Req) -> Invocation<Result<R, E>> + Send + Sync;

/// A handler bound to a shared receiver, the equivalent of a bound method.
///
/// A `Method` has no room for per-handler metadata: many methods share one
/// receiver and one method function serves many receivers. Marking it exempt
/// therefore wraps it in an [`Exempt`] forwarder.
pub struct Method<T, Req, R, E> {
    receiver: Arc<T>,
    call: Arc<Call<T, Req, R, E>>,
    meta: HandlerMeta,
}

impl<T, Req, R, E> Method<T, Req, R, E>
where
    T: Send + Sync + 'static,
    Req: 'static,
    R: 'static,
    E: 'static,
{
    /// Bind a synchronous method to `receiver`.
    pub fn sync<F>(receiver: Arc<T>, name: impl Into<Cow<'static, str>>, method: F) -> Self
    where
        F: Fn(&T, Req) -> Result<R, E> + Send + Sync + 'static,
    {
        Self {
            receiver,
            call: Arc::new(move |receiver: &Arc<T>, req: Req| {
                Invocation::ready(method(receiver.as_ref(), req))
            }),
            meta: HandlerMeta::new(name, Convention::Synchronous),
        }
    }

    /// Bind an async method to `receiver`.
    ///
    /// The method receives its own handle on the receiver so the returned
    /// future can outlive the borrow of the handler.
    pub fn suspending<F, Fut>(receiver: Arc<T>, name: impl Into<Cow<'static, str>>, method: F) -> Self
    where
        F: Fn(Arc<T>, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        Self {
            receiver,
            call: Arc::new(move |receiver: &Arc<T>, req: Req| {
                Invocation::suspended(method(receiver.clone(), req))
            }),
            meta: HandlerMeta::new(name, Convention::Suspending),
        }
    }
}

impl<T, Req, R, E> Method<T, Req, R, E> {
    /// Attach documentation for diagnostics.
    pub fn with_doc(mut self, doc: impl Into<Cow<'static, str>>) -> Self {
        self.meta = self.meta.with_doc(doc);
        self
    }
}

impl<T, Req, R, E> Clone for Method<T, Req, R, E> {
    fn clone(&self) -> Self {
        Self {
            receiver: self.receiver.clone(),
            call: self.call.clone(),
            meta: self.meta.clone(),
        }
    }
}

impl<T, Req, R, E> fmt::Debug for Method<T, Req, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("meta", &self.meta).finish()
    }
}

// No marker storage: always reports the default.
impl<T, Req, R, E> Exemption for Method<T, Req, R, E> {}

impl<T, Req, R, E> MarkExempt for Method<T, Req, R, E> {
    type Marked = Exempt<Self>;

    fn authentication_exempt(self) -> Exempt<Self> {
        let meta = self.meta.rebind();
        Exempt::with_meta(self, meta)
    }
}

impl<T, Req, R, E> Handler<Req> for Method<T, Req, R, E>
where
    T: Send + Sync,
{
    type Response = R;
    type Error = E;

    fn call(&self, req: Req) -> Invocation<Result<R, E>> {
        (self.call)(&self.receiver, req)
    }

    fn meta(&self) -> &HandlerMeta {
        &self.meta
    }

    fn shape(&self) -> HandlerShape {
        HandlerShape::BoundMethod
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exemption::is_handler_authentication_exempt;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio_test::{assert_pending, assert_ready, task};

    struct Counter {
        total: AtomicU64,
        limit: u64,
    }

    impl Counter {
        fn add(&self, n: u64) -> Result<u64, String> {
            if n > self.limit {
                return Err(format!("{} exceeds limit {}", n, self.limit));
            }
            Ok(self.total.fetch_add(n, Ordering::SeqCst) + n)
        }
    }

    fn counter(limit: u64) -> Arc<Counter> {
        Arc::new(Counter {
            total: AtomicU64::new(0),
            limit,
        })
    }

    #[test]
    fn test_unmarked_method_is_not_exempt() {
        let method = Method::sync(counter(10), "add", Counter::add);
        assert!(!is_handler_authentication_exempt(&method));
    }

    #[test]
    fn test_marking_wraps_and_preserves_name() {
        let method = Method::sync(counter(10), "add", Counter::add).with_doc("Add to the total.");
        let id = method.meta().id();

        let marked = method.authentication_exempt();
        assert!(is_handler_authentication_exempt(&marked));
        assert_eq!(marked.shape(), HandlerShape::Forwarder);
        assert_ne!(marked.meta().id(), id);
        assert_eq!(marked.meta().name(), "add");
        assert_eq!(marked.meta().doc(), Some("Add to the total."));
        assert_eq!(marked.meta().convention(), Convention::Synchronous);
    }

    #[test]
    fn test_marking_twice_returns_same_wrapper() {
        let marked = Method::sync(counter(10), "add", Counter::add).authentication_exempt();
        let id = marked.meta().id();

        let again = marked.authentication_exempt();
        assert!(again.is_authentication_exempt());
        assert_eq!(again.meta().id(), id);
    }

    #[test]
    fn test_sync_wrapper_stays_synchronous() {
        let receiver = counter(10);
        let marked = Method::sync(receiver.clone(), "add", Counter::add).authentication_exempt();

        let invocation = marked.call(4);
        assert!(invocation.is_ready());
        assert_eq!(futures::executor::block_on(invocation), Ok(4));
        assert_eq!(receiver.total.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_suspending_wrapper_suspends_like_the_method() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let rx = Arc::new(std::sync::Mutex::new(Some(rx)));

        let method = Method::suspending(counter(10), "add_later", move |c: Arc<Counter>, n: u64| {
            let rx = rx.lock().unwrap().take();
            async move {
                if let Some(rx) = rx {
                    let _ = rx.await;
                }
                c.add(n)
            }
        });
        let marked = method.authentication_exempt();
        assert_eq!(marked.meta().convention(), Convention::Suspending);

        let mut invocation = task::spawn(marked.call(3));
        assert_pending!(invocation.poll());
        tx.send(()).unwrap();
        assert_eq!(assert_ready!(invocation.poll()), Ok(3));
    }

    #[test]
    fn test_wrapper_forwards_errors() {
        let marked = Method::sync(counter(10), "add", Counter::add).authentication_exempt();
        let result = futures::executor::block_on(marked.call(11));
        assert_eq!(result, Err("11 exceeds limit 10".to_string()));
    }

    proptest! {
        #[test]
        fn prop_wrapper_matches_direct_call(limit in 0u64..1000, inputs in prop::collection::vec(0u64..1200, 1..16)) {
            let direct = Method::sync(counter(limit), "add", Counter::add);
            let marked = Method::sync(counter(limit), "add", Counter::add).authentication_exempt();

            for n in inputs {
                let expected = futures::executor::block_on(direct.call(n));
                let actual = futures::executor::block_on(marked.call(n));
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
