//! MongoDB document-store backend.
//!
//! Each collection maps to a MongoDB collection in the configured database.
//! Records are stored as `{id, title, author}` documents next to MongoDB's own
//! `_id`; queries always filter on the record `id`, never on `_id`.
//!
//! Field filters are case-sensitive against the stored key. Field names are
//! normalized through [`RecordField`](crate::types::RecordField) first, so
//! `"Title"` and `"title"` both query the `title` key.

mod backend;
mod storage;

pub use backend::{MongoBackend, MongoConfig};
