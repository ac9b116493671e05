//! Version 1 API routes.

use crate::{
    error::{ApiError, ApiResult},
    middleware::{auth::api_key::extract_key, AuthRequiredLayer},
    state::AppState,
};
use axum::{
    extract::{Query, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    routing::get_service,
    Json, Router,
};
use portcullis_core::{AuthService, Function, MarkExempt, Method};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

pub(super) fn router<A>(gate: &AuthRequiredLayer<A>, state: &AppState) -> Router
where
    A: AuthService<Parts> + 'static,
    A::Error: Into<ApiError>,
{
    let status = Arc::new(StatusController::new(state.started_at));
    let reports = Arc::new(ReportStore::sample());

    Router::new()
        .route(
            "/status",
            get_service(gate.endpoint(
                Method::suspending(status, "status", StatusController::status)
                    .with_doc("Service status, reachable without credentials.")
                    .authentication_exempt(),
            )),
        )
        .route(
            "/whoami",
            get_service(gate.endpoint(Function::suspending("whoami", whoami))),
        )
        .route(
            "/reports",
            get_service(gate.endpoint(Method::sync(reports, "reports", ReportStore::list))),
        )
}

/// Public status endpoint.
#[derive(Debug)]
pub struct StatusController {
    version: &'static str,
    started_at: Instant,
}

impl StatusController {
    pub fn new(started_at: Instant) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            started_at,
        }
    }

    pub async fn status(self: Arc<Self>, _req: Request) -> ApiResult<Response> {
        Ok(Json(json!({
            "status": "ok",
            "version": self.version,
            "uptime_secs": self.started_at.elapsed().as_secs(),
        }))
        .into_response())
    }
}

async fn whoami(req: Request) -> ApiResult<Response> {
    // Only reachable once the gate accepted a key.
    let hint = extract_key(req.headers(), true)
        .map(|key| format!("{}…", key.chars().take(4).collect::<String>()))
        .unwrap_or_default();

    Ok(Json(json!({ "authenticated": true, "key_hint": hint })).into_response())
}

/// A stored report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: u32,
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<usize>,
}

/// In-memory report listing.
#[derive(Debug, Default)]
pub struct ReportStore {
    reports: Vec<Report>,
}

impl ReportStore {
    pub fn new(reports: Vec<Report>) -> Self {
        Self { reports }
    }

    pub fn sample() -> Self {
        Self::new(vec![
            Report { id: 1, title: "Quarterly access review".into() },
            Report { id: 2, title: "Key rotation audit".into() },
            Report { id: 3, title: "Exempt route inventory".into() },
        ])
    }

    pub fn list(&self, req: Request) -> ApiResult<Response> {
        let Query(query) = Query::<ListQuery>::try_from_uri(req.uri())
            .map_err(|err| ApiError::BadRequest(err.body_text()))?;
        let limit = query.limit.unwrap_or(self.reports.len()).min(self.reports.len());

        Ok(Json(&self.reports[..limit]).into_response())
    }
}
