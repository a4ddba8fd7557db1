//! MongoDB backend configuration and client management.

use std::fmt::Debug;
use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database as MongoDatabase};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::OpContext;
use crate::core::BackendKind;
use crate::error::{BackendError, ConfigError, StorageError, StorageResult};
use crate::types::{CollectionName, Record};

/// MongoDB storage backend.
pub struct MongoBackend {
    client: RwLock<Option<Client>>,
    config: MongoConfig,
}

impl Debug for MongoBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoBackend")
            .field("database", &self.config.database)
            .field("connected", &self.client.read().is_some())
            .finish_non_exhaustive()
    }
}

/// Configuration for the MongoDB backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    /// Connection string, `mongodb://` or `mongodb+srv://`.
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Database holding the collections.
    #[serde(default = "default_database")]
    pub database: String,

    /// Application name reported to the server.
    #[serde(default = "default_app_name")]
    pub app_name: Option<String>,

    /// Connect and server-selection timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound on re-query passes performed by a single delete.
    #[serde(default = "default_max_delete_passes")]
    pub max_delete_passes: u32,
}

fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "bookshelf".to_string()
}

fn default_app_name() -> Option<String> {
    Some("bookshelf".to_string())
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_max_delete_passes() -> u32 {
    16
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            database: default_database(),
            app_name: default_app_name(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_delete_passes: default_max_delete_passes(),
        }
    }
}

impl MongoConfig {
    /// Builds a configuration from `MONGODB_URI` and `MONGODB_DATABASE`.
    pub fn from_env() -> Self {
        Self {
            uri: std::env::var("MONGODB_URI").unwrap_or_else(|_| default_uri()),
            database: std::env::var("MONGODB_DATABASE").unwrap_or_else(|_| default_database()),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uri.trim().is_empty() {
            return Err(ConfigError::MissingParameter {
                backend: BackendKind::MongoDB,
                parameter: "uri".to_string(),
            });
        }
        if !(self.uri.starts_with("mongodb://") || self.uri.starts_with("mongodb+srv://")) {
            return Err(invalid("uri", "expected a mongodb:// or mongodb+srv:// URI"));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingParameter {
                backend: BackendKind::MongoDB,
                parameter: "database".to_string(),
            });
        }
        if self.max_delete_passes == 0 {
            return Err(invalid("max_delete_passes", "must be greater than 0"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn invalid(parameter: &str, message: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        backend: BackendKind::MongoDB,
        parameter: parameter.to_string(),
        message: message.to_string(),
    }
}

pub(crate) fn connection_error(err: mongodb::error::Error) -> StorageError {
    BackendError::connection(BackendKind::MongoDB, err).into()
}

impl MongoBackend {
    /// Creates a disconnected backend after validating `config`.
    pub fn new(config: MongoConfig) -> StorageResult<Self> {
        config.validate()?;
        Ok(Self {
            client: RwLock::new(None),
            config,
        })
    }

    pub fn config(&self) -> &MongoConfig {
        &self.config
    }

    fn client(&self) -> StorageResult<Client> {
        self.client
            .read()
            .clone()
            .ok_or_else(|| BackendError::not_connected(BackendKind::MongoDB).into())
    }

    pub(crate) fn database(&self) -> StorageResult<MongoDatabase> {
        Ok(self.client()?.database(&self.config.database))
    }

    /// Typed handle for `collection`.
    pub(crate) fn records(&self, collection: &CollectionName) -> StorageResult<Collection<Record>> {
        Ok(self.database()?.collection::<Record>(collection.as_str()))
    }

    pub(crate) async fn open(&self, ctx: &OpContext) -> StorageResult<()> {
        if self.client.read().is_some() {
            return Ok(());
        }

        let client = ctx
            .run("connect", async {
                let mut options = ClientOptions::parse(&self.config.uri)
                    .await
                    .map_err(connection_error)?;
                options.app_name = self.config.app_name.clone();
                options.connect_timeout = Some(self.config.connect_timeout());
                options.server_selection_timeout = Some(self.config.connect_timeout());

                let client = Client::with_options(options).map_err(connection_error)?;
                client
                    .database(&self.config.database)
                    .run_command(doc! { "ping": 1 })
                    .await
                    .map_err(connection_error)?;
                Ok::<_, StorageError>(client)
            })
            .await?;

        let mut slot = self.client.write();
        if slot.is_none() {
            *slot = Some(client);
            info!(database = %self.config.database, "Connected to MongoDB");
        }
        Ok(())
    }

    pub(crate) async fn shutdown(&self) {
        let client = self.client.write().take();
        if let Some(client) = client {
            client.shutdown().await;
            info!("MongoDB client shut down");
        }
    }

    pub(crate) async fn ping(&self, ctx: &OpContext) -> StorageResult<()> {
        let database = self.database()?;
        ctx.run("ping", async {
            database
                .run_command(doc! { "ping": 1 })
                .await
                .map(|_| ())
                .map_err(connection_error)
        })
        .await
    }
}
