//! Error types for the persistence layer.
//!
//! Errors are grouped by who is at fault: configuration problems found at
//! startup, caller input that can never succeed, backend faults that may clear
//! up on their own, and context expiry (cancellation or deadline).

use thiserror::Error;

use crate::core::BackendKind;

/// The primary error type for all storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Startup configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Caller input errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The caller cancelled the operation.
    #[error("operation '{operation}' was cancelled")]
    Cancelled { operation: String },

    /// The caller-supplied deadline passed before the operation finished.
    #[error("operation '{operation}' exceeded its deadline")]
    DeadlineExceeded { operation: String },
}

impl StorageError {
    /// Returns true when the error is the caller's mistake and retrying the
    /// same request cannot succeed.
    pub fn is_client_error(&self) -> bool {
        matches!(self, StorageError::Validation(_))
    }

    /// Returns true when the backend could not serve a valid request.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::Backend(e) if !matches!(e, BackendError::Internal { .. }))
    }

    /// Returns true for cancellation and deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            StorageError::Cancelled { .. } | StorageError::DeadlineExceeded { .. }
        )
    }
}

/// Configuration errors. These are fatal at startup and never recovered.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The backend name does not match any known backend.
    #[error("unknown storage backend '{name}' (expected one of: {expected})")]
    UnknownBackend { name: String, expected: String },

    /// The backend is known but its cargo feature is not compiled in.
    #[error("storage backend '{kind}' requires the '{feature}' feature")]
    BackendNotCompiled { kind: BackendKind, feature: String },

    /// A required connection parameter is missing.
    #[error("missing required parameter '{parameter}' for {backend} backend")]
    MissingParameter { backend: BackendKind, parameter: String },

    /// A connection parameter has an unusable value.
    #[error("invalid parameter '{parameter}' for {backend} backend: {message}")]
    InvalidParameter {
        backend: BackendKind,
        parameter: String,
        message: String,
    },
}

/// Errors caused by caller input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A collection or table name failed the identifier-safety check.
    #[error("unsafe identifier '{name}': only letters, digits and underscores are allowed, and it may not start with a digit")]
    UnsafeIdentifier { name: String },

    /// The field name is not part of the record schema.
    #[error("unsupported field '{field}' (expected one of: id, title, author)")]
    UnsupportedField { field: String },

    /// A required field is missing or empty.
    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },
}

/// Errors originating from a storage backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Establishing or releasing the connection failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend was used before `connect` or after `close`.
    #[error("{backend_name} backend is not connected")]
    NotConnected { backend_name: String },

    /// Creating the durable structure failed.
    #[error("setup of '{collection}' failed in {backend_name}: {message}")]
    SetupFailed {
        backend_name: String,
        collection: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A read-path operation failed.
    #[error("{operation} on '{collection}' failed in {backend_name}: {message}")]
    QueryFailed {
        backend_name: String,
        operation: String,
        collection: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An insert or delete failed.
    #[error("{operation} on '{collection}' failed in {backend_name}: {message}")]
    WriteFailed {
        backend_name: String,
        operation: String,
        collection: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored value could not be decoded into a record.
    #[error("serialization error in {backend_name}: {message}")]
    SerializationError {
        backend_name: String,
        message: String,
    },

    /// An internal task failed before reporting a result.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
    },
}

impl BackendError {
    /// Wraps a driver error raised while reading.
    pub fn query<E>(kind: BackendKind, operation: &str, collection: &str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BackendError::QueryFailed {
            backend_name: kind.to_string(),
            operation: operation.to_string(),
            collection: collection.to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Wraps a driver error raised while writing.
    pub fn write<E>(kind: BackendKind, operation: &str, collection: &str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BackendError::WriteFailed {
            backend_name: kind.to_string(),
            operation: operation.to_string(),
            collection: collection.to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Wraps a driver error raised while connecting or closing.
    pub fn connection<E>(kind: BackendKind, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BackendError::ConnectionFailed {
            backend_name: kind.to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// The backend has no live connection.
    pub fn not_connected(kind: BackendKind) -> Self {
        BackendError::NotConnected {
            backend_name: kind.to_string(),
        }
    }
}

/// Advisory error: the secondary write failed while the primary succeeded.
///
/// Never returned to callers. The orchestrator logs it because the primary is
/// authoritative and the caller already has the primary's record.
#[derive(Error, Debug)]
#[error("secondary {secondary} write to '{collection}' failed after primary {primary} succeeded (record {record_id}): {source}")]
pub struct PartialWriteError {
    pub primary: BackendKind,
    pub secondary: BackendKind,
    pub collection: String,
    pub record_id: String,
    #[source]
    pub source: StorageError,
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(BackendError::SerializationError {
            backend_name: "json".to_string(),
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = StorageError::from(ValidationError::UnsupportedField {
            field: "isbn".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "unsupported field 'isbn' (expected one of: id, title, author)"
        );
        assert!(err.is_client_error());
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_backend_error_is_unavailable() {
        let err = StorageError::from(BackendError::not_connected(BackendKind::Postgres));
        assert_eq!(err.to_string(), "postgres backend is not connected");
        assert!(err.is_unavailable());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_internal_error_is_not_unavailable() {
        let err = StorageError::from(BackendError::Internal {
            backend_name: "dual-write".to_string(),
            message: "task panicked".to_string(),
        });
        assert!(!err.is_unavailable());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_query_error_keeps_context() {
        let io = std::io::Error::other("socket closed");
        let err = BackendError::query(BackendKind::Postgres, "find_by_field", "books", io);
        let message = err.to_string();
        assert!(message.contains("find_by_field"));
        assert!(message.contains("books"));
        assert!(message.contains("socket closed"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_timeout_classification() {
        let cancelled = StorageError::Cancelled {
            operation: "insert".to_string(),
        };
        let expired = StorageError::DeadlineExceeded {
            operation: "insert".to_string(),
        };
        assert!(cancelled.is_timeout());
        assert!(expired.is_timeout());
        assert!(!cancelled.is_unavailable());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingParameter {
            backend: BackendKind::MongoDB,
            parameter: "uri".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "missing required parameter 'uri' for mongodb backend"
        );
    }

    #[test]
    fn test_partial_write_error_display() {
        let err = PartialWriteError {
            primary: BackendKind::Memory,
            secondary: BackendKind::Postgres,
            collection: "books".to_string(),
            record_id: "abc".to_string(),
            source: BackendError::not_connected(BackendKind::Postgres).into(),
        };
        let message = err.to_string();
        assert!(message.contains("secondary postgres"));
        assert!(message.contains("primary memory"));
        assert!(message.contains("abc"));
    }
}
