//! PostgreSQL backend implementation.
//!
//! Each collection is a table. Connections come from a deadpool-postgres
//! pool created on [`connect`](crate::core::Database::connect).
//!
//! Table names pass the identifier-safety check before being spliced into
//! SQL, column names come from the closed [`RecordField`](crate::types::RecordField)
//! set, and every value is a bind parameter.
//!
//! # Example
//!
//! ```no_run
//! use bookshelf_persistence::backends::postgres::{PostgresBackend, PostgresConfig};
//! use bookshelf_persistence::core::Database;
//! use bookshelf_persistence::OpContext;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = PostgresBackend::new(PostgresConfig::from_env())?;
//! let ctx = OpContext::new();
//! backend.connect(&ctx).await?;
//! backend.setup(&ctx).await?;
//!
//! let books = backend.all(&ctx, "books").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS books (
//!     id TEXT PRIMARY KEY,
//!     title VARCHAR(255) NOT NULL,
//!     author VARCHAR(255) NOT NULL
//! );
//! ```

mod backend;
pub(crate) mod schema;
mod storage;

pub use backend::{PostgresBackend, PostgresConfig};
