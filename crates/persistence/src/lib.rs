//! Bookshelf Persistence Layer
//!
//! This crate provides interchangeable storage backends for book records and
//! a dual-write orchestrator that mirrors writes to an optional secondary
//! backend.
//!
//! # Features
//!
//! - **One capability set**: every backend implements [`core::Database`]
//! - **Multiple Backends**: in-memory, PostgreSQL, MongoDB
//! - **Dual writes**: [`composite::DualWriteStorage`] writes to a primary and
//!   a secondary concurrently and reads from the primary only
//! - **Cancellation and deadlines**: every operation takes an [`OpContext`]
//!
//! # Backend Features
//!
//! Enable backends with feature flags in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! bookshelf-persistence = { version = "0.1", default-features = false, features = ["postgres"] }
//! ```
//!
//! Available backend features:
//! - `postgres` (default) - PostgreSQL via tokio-postgres and deadpool-postgres
//! - `mongodb` (default) - MongoDB via the official driver
//!
//! The in-memory backend is always available.
//!
//! # Architecture
//!
//! - [`types`] - the record model, field dispatch table and identifier checks
//! - [`error`] - error types for all operations
//! - [`context`] - per-operation cancellation and deadlines
//! - [`core`] - the [`Database`](core::Database) trait
//! - [`backends`] - backend implementations
//! - [`registry`] - resolves configured names to backends
//! - [`composite`] - dual-write orchestration and status reporting
//!
//! # Quick Start
//!
//! ```
//! use std::collections::HashMap;
//!
//! use bookshelf_persistence::backends::memory::MemoryBackend;
//! use bookshelf_persistence::core::Database;
//! use bookshelf_persistence::types::Record;
//! use bookshelf_persistence::OpContext;
//!
//! # tokio_test::block_on(async {
//! let seed = HashMap::from([(
//!     "books".to_string(),
//!     vec![
//!         Record::new("", "Fictions", "Jorge Luis Borges"),
//!         Record::new("", "The Aleph", "Jorge Luis Borges"),
//!         Record::new("", "Fictions", "John Smith"),
//!     ],
//! )]);
//! let db = MemoryBackend::with_seed(seed);
//! let ctx = OpContext::new();
//! db.connect(&ctx).await.unwrap();
//!
//! let fictions = db.find_by_field(&ctx, "books", "title", "Fictions").await.unwrap();
//! assert_eq!(fictions.len(), 2);
//!
//! let removed = db.delete(&ctx, "books", "title", "Fictions").await.unwrap();
//! assert_eq!(removed, 2);
//! # });
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod composite;
pub mod context;
pub mod core;
pub mod error;
pub mod registry;
pub mod types;

// Re-export commonly used types at crate root
pub use context::OpContext;
pub use error::{StorageError, StorageResult};
pub use types::{InsertInput, Record, RecordField};

// Re-export core traits
pub use core::{BackendKind, Database, DynDatabase};

pub use composite::{DualWriteStorage, StatusReport, Tier};
pub use registry::{BackendRegistry, BackendSettings};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
