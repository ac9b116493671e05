//! Shared application state.

use crate::config::ServerConfig;
use std::sync::Arc;
use std::time::Instant;

/// State shared by route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }
}
