//! Storage traits and backend identification.
//!
//! - [`Database`] - the capability set every backend implements
//! - [`BackendKind`] - identifies a backend for diagnostics and dispatch

mod backend;
mod database;

pub use backend::BackendKind;
pub use database::{DEFAULT_PAGE_LIMIT, Database, DynDatabase};
