//! Resolves configured backend names to backend instances.

use std::sync::Arc;

use tracing::debug;

use crate::backends::memory::MemoryBackend;
use crate::core::{BackendKind, DynDatabase};
use crate::error::{ConfigError, StorageResult};

#[cfg(feature = "postgres")]
use crate::backends::postgres::{PostgresBackend, PostgresConfig};

#[cfg(feature = "mongodb")]
use crate::backends::mongodb::{MongoBackend, MongoConfig};

/// Connection settings for every compiled-in backend.
#[derive(Debug, Clone, Default)]
pub struct BackendSettings {
    #[cfg(feature = "postgres")]
    pub postgres: PostgresConfig,

    #[cfg(feature = "mongodb")]
    pub mongodb: MongoConfig,
}

/// Maps backend names to new, not-yet-connected backend instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendRegistry;

impl BackendRegistry {
    /// Resolves `name` (see [`BackendKind`]'s `FromStr` for accepted aliases).
    ///
    /// Unknown names, backends whose feature is compiled out and invalid
    /// connection settings are configuration errors.
    pub fn resolve(name: &str, settings: &BackendSettings) -> StorageResult<DynDatabase> {
        let kind: BackendKind = name.parse()?;
        let db = Self::build(kind, settings)?;
        debug!(name, backend = %kind, "Resolved storage backend");
        Ok(db)
    }

    #[allow(unused_variables)]
    fn build(kind: BackendKind, settings: &BackendSettings) -> StorageResult<DynDatabase> {
        match kind {
            BackendKind::Memory => Ok(Arc::new(MemoryBackend::new())),

            #[cfg(feature = "postgres")]
            BackendKind::Postgres => Ok(Arc::new(PostgresBackend::new(settings.postgres.clone())?)),

            #[cfg(feature = "mongodb")]
            BackendKind::MongoDB => Ok(Arc::new(MongoBackend::new(settings.mongodb.clone())?)),

            other => Err(not_compiled(other).into()),
        }
    }
}

fn not_compiled(kind: BackendKind) -> ConfigError {
    match kind.feature() {
        Some(feature) => ConfigError::BackendNotCompiled {
            kind,
            feature: feature.to_string(),
        },
        None => ConfigError::UnknownBackend {
            name: kind.to_string(),
            expected: BackendKind::ACCEPTED_NAMES.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Database;
    use crate::error::StorageError;

    #[test]
    fn test_resolve_memory_aliases() {
        let settings = BackendSettings::default();
        for name in ["memory", "mem", "In-Memory"] {
            let db = BackendRegistry::resolve(name, &settings).unwrap();
            assert_eq!(db.kind(), BackendKind::Memory);
        }
    }

    #[test]
    fn test_resolve_unknown_name() {
        let err = BackendRegistry::resolve("cassandra", &BackendSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Config(ConfigError::UnknownBackend { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolved_backend_is_not_connected() {
        let db = BackendRegistry::resolve("memory", &BackendSettings::default()).unwrap();
        assert!(!db.is_connected(&crate::OpContext::new()).await);
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_resolve_relational_aliases() {
        let settings = BackendSettings::default();
        for name in ["postgres", "postgresql", "relational", "sql"] {
            let db = BackendRegistry::resolve(name, &settings).unwrap();
            assert_eq!(db.kind(), BackendKind::Postgres);
        }
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_resolve_rejects_invalid_postgres_settings() {
        let mut settings = BackendSettings::default();
        settings.postgres.host = String::new();
        let err = BackendRegistry::resolve("postgres", &settings).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Config(ConfigError::MissingParameter { .. })
        ));
    }

    #[cfg(feature = "mongodb")]
    #[test]
    fn test_resolve_document_aliases() {
        let settings = BackendSettings::default();
        for name in ["mongodb", "mongo", "document", "firestore"] {
            let db = BackendRegistry::resolve(name, &settings).unwrap();
            assert_eq!(db.kind(), BackendKind::MongoDB);
        }
    }

    #[cfg(not(feature = "mongodb"))]
    #[test]
    fn test_resolve_compiled_out_backend() {
        let err = BackendRegistry::resolve("mongodb", &BackendSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Config(ConfigError::BackendNotCompiled { .. })
        ));
    }
}
