//! Error types for the authentication gate.

use thiserror::Error;

/// Why the gate refused to let a request through.
#[derive(Debug, Error)]
pub enum Rejection<A> {
    /// The authentication service answered "not authenticated".
    #[error("Authentication required")]
    Unauthorized,

    /// The authentication service failed to produce an answer.
    #[error("Authentication service failure: {0}")]
    AuthService(A),
}

/// Outcome of a gated handler invocation that did not produce a response.
///
/// `E` is the handler's error type and `A` the authentication service's.
/// Both are carried unchanged.
#[derive(Debug, Error)]
pub enum GateError<E, A> {
    /// Not authenticated for a handler that requires it.
    #[error("Authentication required")]
    Unauthorized,

    /// The authentication service itself failed.
    #[error("Authentication service failure: {0}")]
    AuthService(A),

    /// The handler ran and returned an error.
    #[error("Handler error: {0}")]
    Handler(E),
}

impl<E, A> GateError<E, A> {
    /// Check if the request was rejected for lack of authentication.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Take the authentication service error, if that is what this is.
    pub fn into_auth_service_error(self) -> Option<A> {
        match self {
            Self::AuthService(err) => Some(err),
            _ => None,
        }
    }

    /// Take the handler error, if that is what this is.
    pub fn into_handler_error(self) -> Option<E> {
        match self {
            Self::Handler(err) => Some(err),
            _ => None,
        }
    }
}

impl<E, A> From<Rejection<A>> for GateError<E, A> {
    fn from(rejection: Rejection<A>) -> Self {
        match rejection {
            Rejection::Unauthorized => Self::Unauthorized,
            Rejection::AuthService(err) => Self::AuthService(err),
        }
    }
}

/// Errors raised while marking handlers at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExemptionError {
    /// The handler is neither a plain function nor a bound method, so it can
    /// neither carry the marker nor be wrapped by a forwarder.
    #[error("Handler '{name}' has a shape that cannot be marked authentication exempt")]
    UnsupportedHandlerShape {
        /// Name of the offending handler.
        name: String,
    },
}
