pub mod api;
pub mod auth;
pub mod config;
pub mod core_state; // Shared state built from config
pub mod dashboard; // Client store + derived views
pub mod db;
pub mod letters;
pub mod mailer;
pub mod models;
pub mod stats;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Start the API server and run until Ctrl-C.
pub async fn run() -> Result<(), RunError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    let core = Arc::new(core_state::CoreState::from_config(&config)?);
    let mut server = api::start_api_server(core, config.bind_addr).await?;

    tokio::signal::ctrl_c().await.map_err(RunError::Signal)?;
    tracing::info!("Shutdown requested");
    server.shutdown();
    server.wait().await?;
    Ok(())
}
