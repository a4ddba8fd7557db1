//! Test infrastructure for the persistence layer.
//!
//! Shared fixtures and fault-injecting backends used by the integration
//! tests.

#![allow(dead_code)]

pub mod doubles;
pub mod fixtures;

// Re-export commonly used items
pub use doubles::*;
pub use fixtures::*;
