//! In-memory backend implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::context::OpContext;
use crate::core::{BackendKind, DEFAULT_PAGE_LIMIT, Database};
use crate::error::{BackendError, StorageResult};
use crate::types::{CollectionName, Record, RecordField, generate_id};

/// In-memory storage backend.
///
/// Reads take the shared lock and writes the exclusive lock. The lock is only
/// held for the traversal or mutation itself, never across an await point.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    collections: RwLock<HashMap<String, Vec<Record>>>,
    connected: AtomicBool,
}

impl MemoryBackend {
    /// Creates an empty, disconnected backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a disconnected backend pre-populated with `seed`.
    ///
    /// Seeded records with an empty id are given a fresh one.
    pub fn with_seed(seed: HashMap<String, Vec<Record>>) -> Self {
        let collections = seed
            .into_iter()
            .map(|(name, records)| {
                let records = records
                    .into_iter()
                    .map(|mut record| {
                        if record.id.is_empty() {
                            record.id = generate_id();
                        }
                        record
                    })
                    .collect();
                (name, records)
            })
            .collect();

        Self {
            collections: RwLock::new(collections),
            connected: AtomicBool::new(false),
        }
    }

    /// Number of records held in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// True when `collection` holds no records.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn ensure_connected(&self) -> StorageResult<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(BackendError::not_connected(BackendKind::Memory).into())
        }
    }

    /// Common preamble for data operations.
    fn prepare(&self, ctx: &OpContext, operation: &str, collection: &str) -> StorageResult<CollectionName> {
        ctx.check(operation)?;
        self.ensure_connected()?;
        Ok(CollectionName::parse(collection)?)
    }
}

#[async_trait]
impl Database for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn connect(&self, ctx: &OpContext) -> StorageResult<()> {
        ctx.check("connect")?;
        if !self.connected.swap(true, Ordering::AcqRel) {
            debug!("Memory backend connected");
        }
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        self.collections.write().clear();
        self.connected.store(false, Ordering::Release);
        debug!("Memory backend closed");
        Ok(())
    }

    async fn is_connected(&self, _ctx: &OpContext) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn setup(&self, ctx: &OpContext) -> StorageResult<()> {
        ctx.check("setup")?;
        self.ensure_connected()
    }

    async fn all(&self, ctx: &OpContext, collection: &str) -> StorageResult<Vec<Record>> {
        let collection = self.prepare(ctx, "all", collection)?;
        let collections = self.collections.read();
        Ok(collections
            .get(collection.as_str())
            .map(|records| records.iter().take(DEFAULT_PAGE_LIMIT).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_by_field(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<Vec<Record>> {
        let collection = self.prepare(ctx, "find_by_field", collection)?;
        let field = RecordField::parse(field)?;

        let collections = self.collections.read();
        Ok(collections
            .get(collection.as_str())
            .map(|records| {
                records
                    .iter()
                    .filter(|record| field.matches(record, value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_record(
        &self,
        ctx: &OpContext,
        collection: &str,
        record: Record,
    ) -> StorageResult<Record> {
        let collection = self.prepare(ctx, "insert", collection)?;
        record.validate()?;

        self.collections
            .write()
            .entry(collection.as_str().to_string())
            .or_default()
            .push(record.clone());

        debug!(collection = %collection, id = %record.id, "Inserted record");
        Ok(record)
    }

    async fn delete(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<u64> {
        let collection = self.prepare(ctx, "delete", collection)?;
        let field = RecordField::parse(field)?;

        let mut collections = self.collections.write();
        let Some(records) = collections.get_mut(collection.as_str()) else {
            return Ok(0);
        };

        let before = records.len();
        records.retain(|record| !field.matches(record, value));
        let removed = (before - records.len()) as u64;

        debug!(collection = %collection, %field, removed, "Deleted records");
        Ok(removed)
    }
}
