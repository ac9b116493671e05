//! Route configuration for the Portcullis server.

mod internal;
mod v1;

pub use internal::{route_table, InternalRoute};
pub use v1::{Report, ReportStore, StatusController};

use crate::{
    error::ApiError,
    middleware::AuthRequiredLayer,
    state::AppState,
};
use axum::{
    extract::Request,
    http::request::Parts,
    response::{IntoResponse, Response},
    Router,
};
use portcullis_core::{AuthService, BoxHandler, ExemptionError};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

/// Type-erased route handler.
pub type RouteHandler = BoxHandler<Request, Response, ApiError>;

/// Create the main application router.
///
/// Every route is gated by `auth` unless its handler is authentication
/// exempt. Unmatched paths fall through to a 404 without consulting `auth`.
pub fn create_router<A>(state: &AppState, auth: Arc<A>) -> Result<Router, ExemptionError>
where
    A: AuthService<Parts> + 'static,
    A::Error: Into<ApiError>,
{
    let gate = AuthRequiredLayer::new(auth);

    let common_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(state.config.server.request_timeout()));

    Ok(Router::new()
        .nest("/api/v1", v1::router(&gate, state))
        .nest("/internal", internal::router(&gate, state)?)
        .fallback(fallback_handler)
        .layer(common_middleware))
}

async fn fallback_handler() -> impl IntoResponse {
    ApiError::NotFound("Route".into())
}
