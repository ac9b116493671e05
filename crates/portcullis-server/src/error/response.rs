//! Error response implementation.

use super::types::ApiError;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use portcullis_core::GateError;
use serde::Serialize;
use tracing::{error, warn};

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            error!(
                error = %self,
                code = self.error_code(),
                "Server error occurred"
            );
        } else if matches!(self, ApiError::Unauthorized) {
            warn!(
                error = %self,
                code = self.error_code(),
                "Auth error occurred"
            );
        }

        let message = match &self {
            ApiError::Internal(err) => {
                // Don't expose internal error details in production
                if cfg!(debug_assertions) {
                    format!("{}: {}", self, err)
                } else {
                    "An internal error occurred".to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: self.error_code(),
                message,
            },
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl<A> From<GateError<ApiError, A>> for ApiError
where
    A: Into<ApiError>,
{
    fn from(err: GateError<ApiError, A>) -> Self {
        match err {
            GateError::Unauthorized => ApiError::Unauthorized,
            GateError::AuthService(err) => err.into(),
            GateError::Handler(err) => err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_unauthorized_body() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "success": false,
                "error": { "code": "unauthorized", "message": "Authentication required" }
            })
        );
    }

    #[test]
    fn test_gate_error_conversion() {
        let err: ApiError = GateError::<ApiError, ApiError>::Unauthorized.into();
        assert!(matches!(err, ApiError::Unauthorized));

        let err: ApiError =
            GateError::<ApiError, ApiError>::AuthService(ApiError::AuthUnavailable("x".into())).into();
        assert!(matches!(err, ApiError::AuthUnavailable(_)));

        let err: ApiError =
            GateError::<ApiError, ApiError>::Handler(ApiError::NotFound("Report".into())).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
