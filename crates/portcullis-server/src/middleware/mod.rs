//! Middleware for the Portcullis server.

pub mod auth;

pub use auth::{ApiKeyAuth, AuthError, AuthRequiredLayer, AuthRequiredMiddleware, HandlerService};
