//! # bookshelf-rest - HTTP API for the Bookshelf service
//!
//! Exposes the record store over HTTP with [axum]. Handlers are generic over
//! any [`Database`](bookshelf_persistence::Database), so the same router serves
//! a single backend or the dual-write orchestrator.
//!
//! ## Backend Support
//!
//! Storage backends are configured through feature flags passed through to
//! `bookshelf-persistence`:
//!
//! - `postgres` - PostgreSQL backend
//! - `mongodb` - MongoDB backend
//!
//! The in-memory backend is always available.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use bookshelf_persistence::backends::memory::MemoryBackend;
//! use bookshelf_rest::{ServerConfig, create_app_with_config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let app = create_app_with_config(Arc::new(MemoryBackend::new()), config.clone());
//!
//!     let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Routes
//!
//! All routes live under `/api/v1`; see [`routing::create_routes`].

#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routing;
pub mod state;

pub use config::ServerConfig;
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use bookshelf_persistence::Database;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the axum application with custom configuration.
///
/// Storage calls run under the configured request timeout. The HTTP timeout
/// layer fires one second after that.
pub fn create_app_with_config<S>(storage: Arc<S>, config: ServerConfig) -> Router
where
    S: Database + 'static,
{
    info!(backend = %storage.kind(), "Creating HTTP API");

    let state = AppState::new(storage, config.clone());
    let router = routing::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout + 1),
        ));

    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.cors_origins == "*" {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Initializes the tracing subscriber. Call once at startup.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "bookshelf={level},bookshelf_rest={level},bookshelf_persistence={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
