//! Seed data shared across backend tests.

use std::collections::HashMap;

use bookshelf_persistence::OpContext;
use bookshelf_persistence::backends::memory::MemoryBackend;
use bookshelf_persistence::core::Database;
use bookshelf_persistence::types::Record;

pub const BOOKS: &str = "books";
pub const BORGES: &str = "Jorge Luis Borges";

/// Two Borges books and a second "Fictions" by another author.
pub fn seed_records() -> Vec<Record> {
    vec![
        Record::new("1", "Fictions", BORGES),
        Record::new("2", "The Aleph", BORGES),
        Record::new("3", "Fictions", "John Smith"),
    ]
}

/// A connected memory backend holding [`seed_records`] in [`BOOKS`].
pub async fn seeded_memory() -> MemoryBackend {
    let db = MemoryBackend::with_seed(HashMap::from([(BOOKS.to_string(), seed_records())]));
    db.connect(&OpContext::new())
        .await
        .expect("memory backend connects");
    db
}

/// A connected, empty memory backend.
pub async fn empty_memory() -> MemoryBackend {
    let db = MemoryBackend::new();
    db.connect(&OpContext::new())
        .await
        .expect("memory backend connects");
    db
}

/// Record ids, for order-insensitive comparisons.
pub fn ids(records: &[Record]) -> Vec<&str> {
    let mut ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    ids.sort_unstable();
    ids
}
