//! Uniform invocation result for synchronous and suspending handlers.

use super::meta::Convention;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The result of calling a [`Handler`](super::Handler).
///
/// A synchronous handler produces a *ready* invocation: awaiting it completes
/// on the first poll and never yields to the scheduler. A suspending handler
/// produces a *suspended* invocation wrapping its future, so every suspension
/// point of the handler is observed exactly once by whoever awaits it.
#[must_use = "invocations do nothing unless awaited"]
pub struct Invocation<T> {
    state: State<T>,
}

enum State<T> {
    Ready(Option<T>),
    Suspended(BoxFuture<'static, T>),
}

impl<T> Invocation<T> {
    /// An invocation whose value is already available.
    pub fn ready(value: T) -> Self {
        Self {
            state: State::Ready(Some(value)),
        }
    }

    /// An invocation that completes when `future` does.
    pub fn suspended<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            state: State::Suspended(Box::pin(future)),
        }
    }

    /// The calling convention that produced this invocation.
    pub fn convention(&self) -> Convention {
        match self.state {
            State::Ready(_) => Convention::Synchronous,
            State::Suspended(_) => Convention::Suspending,
        }
    }

    /// Check if the value is available without polling.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }
}

// The ready value is only ever moved out, never pinned.
impl<T> Unpin for Invocation<T> {}

impl<T> Future for Invocation<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        match &mut self.get_mut().state {
            State::Ready(value) => {
                Poll::Ready(value.take().expect("Invocation polled after completion"))
            }
            State::Suspended(future) => future.as_mut().poll(cx),
        }
    }
}

impl<T> fmt::Debug for Invocation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("convention", &self.convention())
            .finish()
    }
}
