//! Core types shared by every backend.
//!
//! - [`Record`] - the stored book record
//! - [`InsertInput`] - caller-supplied fields for a new record
//! - [`RecordField`] - the closed set of queryable fields
//! - [`CollectionName`] - a validated collection or table name

mod field;
mod identifier;
mod record;

pub use field::RecordField;
pub use identifier::{CollectionName, is_safe_identifier};
pub use record::{InsertInput, Record, generate_id};
