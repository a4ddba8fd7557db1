//! Database backend implementations.
//!
//! Each backend implements [`Database`](crate::core::Database). Backends that
//! need a network driver are gated behind a feature flag.
//!
//! # Available Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Memory | (always) | In-process map, for tests and local development |
//! | PostgreSQL | `postgres` | One table per collection, pooled connections |
//! | MongoDB | `mongodb` | One document collection per collection |

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mongodb")]
pub mod mongodb;
