//! Authentication-required middleware.
//!
//! Every request goes through the same two steps:
//!
//! 1. If the handler is authentication exempt, call it.
//! 2. Otherwise ask the [`AuthService`]. Call the handler on `true`, reject
//!    with [`Rejection::Unauthorized`] on `false`, and pass any service error
//!    through unchanged.
//!
//! The authentication check always completes before the handler is invoked.

use crate::auth::AuthService;
use crate::error::{GateError, Rejection};
use crate::exemption::{is_handler_authentication_exempt, Exemption};
use crate::handler::Handler;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a request was allowed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// The handler does not require authentication.
    Exempt,
    /// The authentication service accepted the request.
    Authenticated,
}

/// Middleware enforcing authentication on every handler that is not exempt.
///
/// Holds nothing but the shared service handle, so one instance can serve
/// any number of concurrent requests.
pub struct AuthenticationRequired<A: ?Sized> {
    auth: Arc<A>,
}

/// Build the authentication-required middleware around `auth`.
pub fn authentication_required_middleware<A: ?Sized>(auth: Arc<A>) -> AuthenticationRequired<A> {
    AuthenticationRequired::new(auth)
}

impl<A: ?Sized> AuthenticationRequired<A> {
    /// Create new middleware.
    pub fn new(auth: Arc<A>) -> Self {
        Self { auth }
    }

    /// Decide whether `req` may reach `handler`, without invoking it.
    pub async fn authorize<Req, H>(
        &self,
        req: &Req,
        handler: &H,
    ) -> Result<Decision, Rejection<A::Error>>
    where
        A: AuthService<Req>,
        Req: Sync + ?Sized,
        H: Exemption + Sync + ?Sized,
    {
        if is_handler_authentication_exempt(handler) {
            return Ok(Decision::Exempt);
        }

        match self.auth.is_request_authenticated(req).await {
            Ok(true) => Ok(Decision::Authenticated),
            Ok(false) => {
                warn!("Request rejected: authentication required");
                Err(Rejection::Unauthorized)
            }
            Err(err) => Err(Rejection::AuthService(err)),
        }
    }

    /// Run `handler` for `req` if the gate allows it.
    pub async fn handle<Req, H>(
        &self,
        req: Req,
        handler: &H,
    ) -> Result<H::Response, GateError<H::Error, A::Error>>
    where
        A: AuthService<Req>,
        Req: Sync,
        H: Handler<Req> + ?Sized,
    {
        let decision = self.authorize(&req, handler).await?;
        debug!(
            handler = %handler.meta().name(),
            id = %handler.meta().id(),
            decision = ?decision,
            "Invoking handler"
        );

        handler.call(req).await.map_err(GateError::Handler)
    }
}

impl<A: ?Sized> Clone for AuthenticationRequired<A> {
    fn clone(&self) -> Self {
        Self {
            auth: self.auth.clone(),
        }
    }
}

impl<A: ?Sized> fmt::Debug for AuthenticationRequired<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationRequired").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exemption::MarkExempt;
    use crate::handler::{Function, Method};
    use async_trait::async_trait;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::task::{Context, Poll};
    use tokio_test::{assert_pending, assert_ready, task};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Request {
        user: Option<&'static str>,
    }

    #[derive(Debug, PartialEq, Eq)]
    struct BackendDown;

    enum Answer {
        Accept,
        Deny,
        Fail,
    }

    struct FakeAuth {
        answer: Answer,
        calls: AtomicUsize,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl FakeAuth {
        fn new(answer: Answer) -> Arc<Self> {
            Self::with_log(answer, Arc::default())
        }

        fn with_log(answer: Answer, log: Arc<Mutex<Vec<&'static str>>>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                calls: AtomicUsize::new(0),
                log,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthService<Request> for FakeAuth {
        type Error = BackendDown;

        async fn is_request_authenticated(&self, _req: &Request) -> Result<bool, BackendDown> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.log.lock().unwrap().push("auth");
            match self.answer {
                Answer::Accept => Ok(true),
                Answer::Deny => Ok(false),
                Answer::Fail => Err(BackendDown),
            }
        }
    }

    /// Sets its flag when dropped.
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Starts checking and never answers.
    #[derive(Default)]
    struct StuckAuth {
        started: AtomicBool,
        dropped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl AuthService<Request> for StuckAuth {
        type Error = BackendDown;

        async fn is_request_authenticated(&self, _req: &Request) -> Result<bool, BackendDown> {
            let _guard = DropFlag(self.dropped.clone());
            self.started.store(true, Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(true)
        }
    }

    /// Returns `Pending` exactly once before completing.
    struct YieldOnce {
        yielded: bool,
    }

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.yielded {
                Poll::Ready(())
            } else {
                self.yielded = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    fn counted(
        name: &'static str,
        reply: &'static str,
        hits: Arc<AtomicUsize>,
    ) -> Function<Request, &'static str, String> {
        Function::sync(name, move |_req: Request| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(reply)
        })
    }

    fn anonymous() -> Request {
        Request { user: None }
    }

    #[tokio::test]
    async fn test_exempt_sync_handler_skips_auth() {
        let auth = FakeAuth::new(Answer::Deny);
        let gate = authentication_required_middleware(auth.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        let handler = counted("health", "ok", hits.clone()).authentication_exempt();

        let response = gate.handle(anonymous(), &handler).await.unwrap();

        assert_eq!(response, "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(auth.calls(), 0);
    }

    #[tokio::test]
    async fn test_authenticated_request_reaches_handler() {
        let auth = FakeAuth::new(Answer::Accept);
        let gate = authentication_required_middleware(auth.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        let handler = counted("data", "data", hits.clone());

        let response = gate
            .handle(Request { user: Some("alice") }, &handler)
            .await
            .unwrap();

        assert_eq!(response, "data");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(auth.calls(), 1);
    }

    #[tokio::test]
    async fn test_unauthenticated_request_is_rejected() {
        let auth = FakeAuth::new(Answer::Deny);
        let gate = authentication_required_middleware(auth.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        let handler = counted("data", "data", hits.clone());

        let err = gate.handle(anonymous(), &handler).await.unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(auth.calls(), 1);
    }

    #[test]
    fn test_exempt_suspending_method_suspends_once() {
        struct Readiness;

        impl Readiness {
            async fn check(self: Arc<Self>, _req: Request) -> Result<&'static str, String> {
                YieldOnce { yielded: false }.await;
                Ok("ready")
            }
        }

        let auth = FakeAuth::new(Answer::Fail);
        let gate = authentication_required_middleware(auth.clone());
        let handler =
            Method::suspending(Arc::new(Readiness), "check", Readiness::check).authentication_exempt();

        let mut response = task::spawn(gate.handle(anonymous(), &handler));
        assert_pending!(response.poll());
        assert_eq!(assert_ready!(response.poll()).unwrap(), "ready");
        assert_eq!(auth.calls(), 0);
    }

    #[test]
    fn test_exempt_sync_handler_never_suspends() {
        let auth = FakeAuth::new(Answer::Fail);
        let gate = authentication_required_middleware(auth);
        let handler = counted("health", "ok", Arc::default()).authentication_exempt();

        let mut response = task::spawn(gate.handle(anonymous(), &handler));
        assert_eq!(assert_ready!(response.poll()).unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_auth_service_failure_propagates() {
        let auth = FakeAuth::new(Answer::Fail);
        let gate = authentication_required_middleware(auth.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        let handler = counted("data", "data", hits.clone());

        let err = gate.handle(anonymous(), &handler).await.unwrap_err();

        assert_eq!(err.into_auth_service_error(), Some(BackendDown));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_handler_error_is_returned_unchanged() {
        let gate = authentication_required_middleware(FakeAuth::new(Answer::Accept));
        let handler: Function<Request, (), String> =
            Function::sync("broken", |_req: Request| Err("disk full".to_string()));

        let err = gate.handle(anonymous(), &handler).await.unwrap_err();
        assert_eq!(err.into_handler_error(), Some("disk full".to_string()));
    }

    #[tokio::test]
    async fn test_auth_completes_before_handler_runs() {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::default();
        let auth = FakeAuth::with_log(Answer::Accept, log.clone());
        let gate = authentication_required_middleware(auth);

        let handler_log = log.clone();
        let handler: Function<Request, (), String> =
            Function::suspending("write", move |_req: Request| {
                let log = handler_log.clone();
                async move {
                    log.lock().unwrap().push("handler");
                    Ok(())
                }
            });

        gate.handle(anonymous(), &handler).await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["auth", "handler"]);
    }

    #[tokio::test]
    async fn test_authorize_reports_decision() {
        let gate = authentication_required_middleware(FakeAuth::new(Answer::Accept));
        let open = counted("open", "", Arc::default()).authentication_exempt();
        let closed = counted("closed", "", Arc::default());

        assert_eq!(gate.authorize(&anonymous(), &open).await.unwrap(), Decision::Exempt);
        assert_eq!(
            gate.authorize(&anonymous(), &closed).await.unwrap(),
            Decision::Authenticated
        );
    }

    #[tokio::test]
    async fn test_gate_works_with_dyn_auth_service() {
        let auth: Arc<dyn AuthService<Request, Error = BackendDown>> = FakeAuth::new(Answer::Deny);
        let gate = authentication_required_middleware(auth);
        let handler = counted("data", "data", Arc::default());

        assert!(gate.handle(anonymous(), &handler).await.unwrap_err().is_unauthorized());
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let auth = FakeAuth::new(Answer::Accept);
        let gate = authentication_required_middleware(auth.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        let handler = counted("data", "data", hits.clone());

        let requests = (0..8).map(|_| gate.handle(anonymous(), &handler));
        let responses = futures::future::join_all(requests).await;

        assert!(responses.iter().all(|r| matches!(r, Ok("data"))));
        assert_eq!(auth.calls(), 8);
        assert_eq!(hits.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_dropping_pending_request_cancels_auth_check() {
        let auth = Arc::new(StuckAuth::default());
        let gate = authentication_required_middleware(auth.clone());
        let hits = Arc::new(AtomicUsize::new(0));
        let handler = counted("data", "data", hits.clone());

        let mut response = task::spawn(gate.handle(anonymous(), &handler));
        assert_pending!(response.poll());
        assert!(auth.started.load(Ordering::SeqCst));
        assert!(!auth.dropped.load(Ordering::SeqCst));

        drop(response);
        assert!(auth.dropped.load(Ordering::SeqCst));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dropping_pending_request_cancels_handler() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = dropped.clone();
        let handler: Function<Request, (), String> =
            Function::suspending("slow", move |_req: Request| {
                let guard = DropFlag(flag.clone());
                async move {
                    let _guard = guard;
                    std::future::pending::<()>().await;
                    Ok(())
                }
            });
        let handler = handler.authentication_exempt();
        let gate = authentication_required_middleware(FakeAuth::new(Answer::Fail));

        let mut response = task::spawn(gate.handle(anonymous(), &handler));
        assert_pending!(response.poll());
        assert!(!dropped.load(Ordering::SeqCst));

        drop(response);
        assert!(dropped.load(Ordering::SeqCst));
    }
}
