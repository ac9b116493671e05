//! Portcullis Server Binary

use anyhow::{bail, Result};
use portcullis_server::{
    config::{load_config, validate_config},
    Server,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = load_config()?;

    // Initialize logging
    portcullis_log::init(config.logging.to_log_config())?;

    if let Err(errors) = validate_config(&config) {
        for err in &errors {
            error!(error = %err, "Invalid configuration");
        }
        bail!("configuration has {} error(s)", errors.len());
    }

    if config.auth.api_keys.is_empty() {
        warn!("No API keys configured, protected routes will answer 503");
    }

    info!("Starting Portcullis Server v{}", env!("CARGO_PKG_VERSION"));

    Server::new(config).run().await?;

    info!("Server shutdown complete");
    Ok(())
}
