//! Internal routes (health and diagnostics).
//!
//! Assembled from a type-erased route table, the way routes loaded from
//! configuration or plugins would be.

use super::RouteHandler;
use crate::{error::ApiResult, middleware::AuthRequiredLayer, state::AppState};
use axum::{
    extract::Request,
    http::request::Parts,
    response::{IntoResponse, Response},
    routing::get_service,
    Json, Router,
};
use portcullis_core::{exempt_boxed, AuthService, ExemptionError, Function, Method};
use serde_json::json;
use std::sync::Arc;

/// One row of the internal route table.
pub struct InternalRoute {
    pub path: &'static str,
    pub handler: RouteHandler,
    pub exempt: bool,
}

/// The internal routes served under `/internal`.
pub fn route_table(state: &AppState) -> Vec<InternalRoute> {
    vec![
        InternalRoute {
            path: "/health",
            handler: Arc::new(Function::sync("health", health).with_doc("Liveness probe.")),
            exempt: true,
        },
        InternalRoute {
            path: "/config",
            handler: Arc::new(
                Method::sync(Arc::new(state.clone()), "config", config_summary)
                    .with_doc("Non-secret view of the running configuration."),
            ),
            exempt: false,
        },
    ]
}

pub(super) fn router<A>(
    gate: &AuthRequiredLayer<A>,
    state: &AppState,
) -> Result<Router, ExemptionError>
where
    A: AuthService<Parts> + 'static,
    A::Error: Into<crate::error::ApiError>,
{
    let mut router = Router::new();
    for route in route_table(state) {
        let handler = if route.exempt {
            exempt_boxed(route.handler)?
        } else {
            route.handler
        };
        router = router.route(route.path, get_service(gate.endpoint(handler)));
    }
    Ok(router)
}

fn health(_req: Request) -> ApiResult<Response> {
    Ok(Json(json!({ "status": "ok" })).into_response())
}

fn config_summary(state: &AppState, _req: Request) -> ApiResult<Response> {
    let config = &state.config;
    Ok(Json(json!({
        "server": {
            "host": config.server.host,
            "port": config.server.port,
            "request_timeout_secs": config.server.request_timeout_secs,
        },
        "auth": {
            "api_keys": config.auth.api_keys.len(),
            "accept_x_api_key": config.auth.accept_x_api_key,
        },
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_core::{is_handler_authentication_exempt, Handler, HandlerShape};

    #[test]
    fn test_route_table_shapes() {
        let table = route_table(&AppState::new(Default::default()));
        let shapes: Vec<_> = table.iter().map(|r| (r.path, r.handler.shape(), r.exempt)).collect();

        assert_eq!(
            shapes,
            vec![
                ("/health", HandlerShape::Function, true),
                ("/config", HandlerShape::BoundMethod, false),
            ]
        );
        assert!(table.iter().all(|r| !is_handler_authentication_exempt(&r.handler)));
    }
}
