//! Bookshelf server
//!
//! Serves the book API over a primary storage backend, optionally mirroring
//! writes to a secondary one.

use std::sync::Arc;
use std::time::Duration;

use bookshelf_persistence::{
    BackendRegistry, Database, DualWriteStorage, DynDatabase, OpContext, StorageResult,
};
use bookshelf_rest::{ServerConfig, create_app_with_config, init_logging};
use clap::Parser;
use tracing::{error, info};

/// Resolves the configured tiers. Unknown or unusable backend names are fatal.
fn resolve_backends(config: &ServerConfig) -> StorageResult<(DynDatabase, Option<DynDatabase>)> {
    let settings = config.backend_settings();
    let primary = BackendRegistry::resolve(&config.primary_backend, &settings)?;
    let secondary = config
        .secondary()
        .map(|name| BackendRegistry::resolve(name, &settings))
        .transpose()?;
    Ok((primary, secondary))
}

/// Starts the Axum HTTP server and returns once a shutdown signal arrives.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let (primary, secondary) = match resolve_backends(&config) {
        Ok(tiers) => tiers,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        port = config.port,
        host = %config.host,
        primary = %primary.kind(),
        secondary = ?secondary.as_ref().map(|db| db.kind().to_string()),
        collection = %config.default_collection,
        "Starting Bookshelf server"
    );

    let startup = OpContext::with_timeout(Duration::from_secs(config.request_timeout));
    let storage = Arc::new(DualWriteStorage::start(&startup, primary, secondary).await);

    let app = create_app_with_config(Arc::clone(&storage), config.clone());
    let served = serve(app, &config).await;

    if let Err(e) = storage.close().await {
        error!(error = %e, "Failed to close primary backend");
    }
    info!("Bookshelf server stopped");

    served
}
