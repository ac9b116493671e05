//! Authentication-required middleware for axum routes.

pub mod api_key;
pub mod layer;
pub mod service;

pub use api_key::{ApiKeyAuth, AuthError};
pub use layer::{AuthRequiredLayer, AuthRequiredMiddleware};
pub use service::HandlerService;
