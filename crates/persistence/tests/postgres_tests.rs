//! PostgreSQL backend integration tests.
//!
//! Configuration tests run without a database. Tests that need a running
//! PostgreSQL instance are ignored by default and read their connection
//! settings from the `PGSQL_*` environment variables.
//!
//! Run with: `cargo test -p bookshelf-persistence --features postgres -- --ignored postgres`

#![cfg(feature = "postgres")]

use bookshelf_persistence::OpContext;
use bookshelf_persistence::backends::postgres::{PostgresBackend, PostgresConfig};
use bookshelf_persistence::core::{BackendKind, Database};
use bookshelf_persistence::error::{BackendError, StorageError};
use bookshelf_persistence::types::InsertInput;

// ============================================================================
// Backend Configuration Tests (no PostgreSQL instance required)
// ============================================================================

#[test]
fn test_postgres_config_defaults() {
    let config = PostgresConfig::default();
    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 5432);
    assert_eq!(config.dbname, "bookshelf");
    assert_eq!(config.user, "postgres");
    assert!(config.password.is_none());
    assert_eq!(config.max_connections, 10);
    assert_eq!(config.connect_timeout_secs, 5);
    assert_eq!(config.collections, vec!["books".to_string()]);
}

#[test]
fn test_postgres_config_serialization() {
    let config = PostgresConfig {
        host: "pg-server".to_string(),
        port: 5433,
        dbname: "test_db".to_string(),
        user: "test_user".to_string(),
        password: Some("secret".to_string()),
        ..Default::default()
    };

    let json = serde_json::to_string(&config).unwrap();
    let deserialized: PostgresConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.host, "pg-server");
    assert_eq!(deserialized.port, 5433);
    assert_eq!(deserialized.dbname, "test_db");
    assert_eq!(deserialized.user, "test_user");
    assert_eq!(deserialized.password, Some("secret".to_string()));
}

#[test]
fn test_postgres_config_partial_json_uses_defaults() {
    let config: PostgresConfig = serde_json::from_str(r#"{"host": "db"}"#).unwrap();
    assert_eq!(config.host, "db");
    assert_eq!(config.port, 5432);
    assert_eq!(config.collections, vec!["books".to_string()]);
}

#[test]
fn test_backend_rejects_invalid_config() {
    let config = PostgresConfig {
        collections: vec!["1books".to_string()],
        ..Default::default()
    };
    assert!(matches!(
        PostgresBackend::new(config),
        Err(StorageError::Config(_))
    ));
}

#[tokio::test]
async fn test_disconnected_backend() {
    let backend = PostgresBackend::new(PostgresConfig::default()).unwrap();
    let ctx = OpContext::new();

    assert_eq!(backend.kind(), BackendKind::Postgres);
    assert!(!backend.is_connected(&ctx).await);

    let err = backend.all(&ctx, "books").await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Backend(BackendError::NotConnected { .. })
    ));
}

#[tokio::test]
async fn test_unsafe_table_rejected_before_io() {
    let backend = PostgresBackend::new(PostgresConfig::default()).unwrap();
    let err = backend
        .find_by_field(&OpContext::new(), "books; DROP TABLE books", "title", "x")
        .await
        .unwrap_err();
    assert!(err.is_client_error());
}

// ============================================================================
// Live Tests (PostgreSQL instance required)
// ============================================================================

async fn live_backend(table: &str) -> PostgresBackend {
    let config = PostgresConfig {
        collections: vec![table.to_string()],
        ..PostgresConfig::from_env()
    };
    let backend = PostgresBackend::new(config).expect("valid config");
    let ctx = OpContext::new();
    backend.connect(&ctx).await.expect("connect to PostgreSQL");
    backend.setup(&ctx).await.expect("create table");
    backend
        .delete(&ctx, table, "author", "Jorge Luis Borges")
        .await
        .expect("clean table");
    backend
}

#[tokio::test]
#[ignore]
async fn test_postgres_insert_find_delete() {
    let table = "bookshelf_it_books";
    let backend = live_backend(table).await;
    let ctx = OpContext::new();

    let record = backend
        .insert(&ctx, table, InsertInput::new("Fictions", "Jorge Luis Borges"))
        .await
        .unwrap();
    backend
        .insert(&ctx, table, InsertInput::new("The Aleph", "Jorge Luis Borges"))
        .await
        .unwrap();

    let found = backend.find_by_field(&ctx, table, "ID", &record.id).await.unwrap();
    assert_eq!(found, vec![record]);

    let removed = backend
        .delete(&ctx, table, "author", "Jorge Luis Borges")
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let found = backend
        .find_by_field(&ctx, table, "author", "Jorge Luis Borges")
        .await
        .unwrap();
    assert!(found.is_empty());

    backend.close().await.unwrap();
    assert!(!backend.is_connected(&ctx).await);
}

#[tokio::test]
#[ignore]
async fn test_postgres_connect_is_idempotent() {
    let backend = live_backend("bookshelf_it_idem").await;
    let ctx = OpContext::new();
    backend.connect(&ctx).await.unwrap();
    assert!(backend.is_connected(&ctx).await);
}
