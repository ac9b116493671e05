//! Portcullis API Server
//!
//! An axum server whose routes sit behind the authentication-required gate
//! from `portcullis-core`. Handlers marked authentication exempt are served
//! to anyone; every other route needs a configured API key.
//!
//! - **Routes**: endpoint definitions built from gate handlers
//! - **Middleware**: the tower adapter for the gate and the API key service
//! - **Config**: layered configuration with validation

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::Router;
use middleware::ApiKeyAuth;
use portcullis_core::ExemptionError;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Server builder for constructing and running the API server.
pub struct Server {
    state: AppState,
    auth: Arc<ApiKeyAuth>,
}

impl Server {
    /// Create a new server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let auth = Arc::new(ApiKeyAuth::from_config(&config.auth));
        Self {
            state: AppState::new(config),
            auth,
        }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Result<Router, ExemptionError> {
        Ok(routes::create_router(&self.state, self.auth.clone())?
            .layer(TraceLayer::new_for_http()))
    }

    /// Run the server, binding to the configured address.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let addr = self.addr()?;
        let router = self.router()?;
        let listener = TcpListener::bind(addr).await?;

        info!(
            %addr,
            api_keys = self.auth.key_count(),
            "Server listening"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }

    /// Get the server's socket address.
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.state.config.server.socket_addr()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
