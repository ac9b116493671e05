//! Portcullis core: per-handler authentication exemption and the
//! authentication-required middleware.
//!
//! Handlers opt out of authentication at definition time with
//! [`MarkExempt::authentication_exempt`]. The middleware built by
//! [`authentication_required_middleware`] consults that marker on every
//! request and only calls the [`AuthService`] for handlers that lack it.
//!
//! ```ignore
//! let health = Function::sync("health", |_req: Request| Ok("ok")).authentication_exempt();
//! let gate = authentication_required_middleware(Arc::new(my_auth_service));
//! let response = gate.handle(request, &health).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod error;
pub mod exemption;
pub mod handler;
pub mod middleware;

pub use auth::AuthService;
pub use error::{ExemptionError, GateError, Rejection};
pub use exemption::{
    exempt_boxed, is_handler_authentication_exempt, Exempt, Exemption, MarkExempt,
};
pub use handler::{
    BoxHandler, Convention, Function, Handler, HandlerId, HandlerMeta, HandlerShape, Invocation,
    Method,
};
pub use middleware::{authentication_required_middleware, AuthenticationRequired, Decision};
