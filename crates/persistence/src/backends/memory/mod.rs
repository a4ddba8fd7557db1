//! In-memory backend.
//!
//! A map from collection name to an ordered list of records behind a single
//! reader/writer lock. Intended for tests and local development; nothing is
//! persisted across restarts.
//!
//! # Example
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
//!     vec![Record::new("", "Fictions", "Jorge Luis Borges")],
//! )]);
//! let db = MemoryBackend::with_seed(seed);
//! let ctx = OpContext::new();
//! db.connect(&ctx).await.unwrap();
//!
//! let removed = db.delete(&ctx, "books", "title", "Fictions").await.unwrap();
//! assert_eq!(removed, 1);
//! # });
//! ```

mod backend;

pub use backend::MemoryBackend;
