//! Error handling for the Portcullis server.

pub mod response;
pub mod types;

pub use types::{ApiError, ApiResult};
