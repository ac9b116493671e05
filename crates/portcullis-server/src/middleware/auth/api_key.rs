//! API key authentication service.

use crate::config::AuthConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use axum::http::{header, request::Parts, HeaderMap};
use portcullis_core::AuthService;
use std::collections::HashSet;
use thiserror::Error;

/// Failures of the API key service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no API keys configured")]
    NoKeysConfigured,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::AuthUnavailable(err.to_string())
    }
}

/// Accepts requests carrying one of a fixed set of API keys.
///
/// Keys are read from `Authorization: Bearer <key>` and, unless disabled,
/// from `x-api-key`. With no keys configured the service cannot answer at
/// all and fails every check.
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    keys: HashSet<String>,
    accept_x_api_key: bool,
}

impl ApiKeyAuth {
    pub fn new<K>(keys: impl IntoIterator<Item = K>) -> Self
    where
        K: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            accept_x_api_key: true,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.api_keys.iter().cloned()).with_x_api_key(config.accept_x_api_key)
    }

    /// Enable or disable the `x-api-key` header.
    pub fn with_x_api_key(mut self, enabled: bool) -> Self {
        self.accept_x_api_key = enabled;
        self
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

#[async_trait]
impl AuthService<Parts> for ApiKeyAuth {
    type Error = AuthError;

    async fn is_request_authenticated(&self, parts: &Parts) -> Result<bool, AuthError> {
        if self.keys.is_empty() {
            return Err(AuthError::NoKeysConfigured);
        }

        Ok(extract_key(&parts.headers, self.accept_x_api_key)
            .map(|key| self.keys.contains(key))
            .unwrap_or(false))
    }
}

/// Find the presented key. Bearer tokens take precedence.
pub(crate) fn extract_key(headers: &HeaderMap, accept_x_api_key: bool) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if bearer.is_some() || !accept_x_api_key {
        return bearer;
    }

    headers.get("x-api-key").and_then(|v| v.to_str().ok())
}
