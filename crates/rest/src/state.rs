//! Application state shared by every request handler.

use std::sync::Arc;
use std::time::Duration;

use bookshelf_persistence::{Database, OpContext};

use crate::config::ServerConfig;

/// Shared application state.
///
/// Generic over the storage so handlers can be tested against a plain
/// backend or the dual-write orchestrator alike.
pub struct AppState<S> {
    storage: Arc<S>,
    config: Arc<ServerConfig>,
}

// S sits behind an Arc and need not be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S: Database> AppState<S> {
    pub fn new(storage: Arc<S>, config: ServerConfig) -> Self {
        Self {
            storage,
            config: Arc::new(config),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_arc(&self) -> Arc<S> {
        Arc::clone(&self.storage)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn default_collection(&self) -> &str {
        &self.config.default_collection
    }

    /// Fresh per-request context carrying the configured deadline.
    pub fn op_context(&self) -> OpContext {
        OpContext::with_timeout(Duration::from_secs(self.config.request_timeout))
    }
}
