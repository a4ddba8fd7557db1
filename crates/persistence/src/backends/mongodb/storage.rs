//! [`Database`] implementation for MongoDB.

use async_trait::async_trait;
use mongodb::Cursor;
use mongodb::bson::{Document, doc};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::context::OpContext;
use crate::core::{BackendKind, DEFAULT_PAGE_LIMIT, Database};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::types::{CollectionName, Record, RecordField};

use super::MongoBackend;

/// Equality filter on one record field.
pub(crate) fn field_filter(field: RecordField, value: &str) -> Document {
    let mut filter = Document::new();
    filter.insert(field.column(), value);
    filter
}

/// Filter selecting the given record ids, still constrained by the field
/// match so a record changed between passes is left alone.
pub(crate) fn delete_filter(ids: Vec<String>, field: RecordField, value: &str) -> Document {
    let mut filter = doc! { "id": { "$in": ids } };
    filter.insert(field.column(), value);
    filter
}

async fn drain<T>(mut cursor: Cursor<T>) -> mongodb::error::Result<Vec<T>>
where
    T: DeserializeOwned + Send + Sync,
{
    let mut items = Vec::new();
    while cursor.advance().await? {
        items.push(cursor.deserialize_current()?);
    }
    Ok(items)
}

fn query_error(operation: &str, collection: &CollectionName, err: mongodb::error::Error) -> StorageError {
    BackendError::query(BackendKind::MongoDB, operation, collection.as_str(), err).into()
}

fn write_error(operation: &str, collection: &CollectionName, err: mongodb::error::Error) -> StorageError {
    BackendError::write(BackendKind::MongoDB, operation, collection.as_str(), err).into()
}

impl MongoBackend {
    /// Record ids currently matching `filter`.
    async fn matching_ids(
        &self,
        ctx: &OpContext,
        collection: &CollectionName,
        filter: Document,
    ) -> StorageResult<Vec<String>> {
        let documents = self.records(collection)?.clone_with_type::<Document>();
        let found = ctx
            .run("delete", async {
                let cursor = documents
                    .find(filter)
                    .projection(doc! { "id": 1, "_id": 0 })
                    .await
                    .map_err(|e| query_error("delete", collection, e))?;
                drain(cursor)
                    .await
                    .map_err(|e| query_error("delete", collection, e))
            })
            .await?;

        found
            .iter()
            .map(|document| {
                document.get_str("id").map(str::to_string).map_err(|e| {
                    StorageError::from(BackendError::SerializationError {
                        backend_name: BackendKind::MongoDB.to_string(),
                        message: format!("document in '{}' has no string id: {}", collection, e),
                    })
                })
            })
            .collect()
    }
}

#[async_trait]
impl Database for MongoBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::MongoDB
    }

    async fn connect(&self, ctx: &OpContext) -> StorageResult<()> {
        self.open(ctx).await
    }

    async fn close(&self) -> StorageResult<()> {
        self.shutdown().await;
        Ok(())
    }

    async fn is_connected(&self, ctx: &OpContext) -> bool {
        match self.ping(ctx).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "MongoDB ping failed");
                false
            }
        }
    }

    async fn setup(&self, ctx: &OpContext) -> StorageResult<()> {
        // Collections are created on first insert.
        ctx.check("setup")?;
        self.database().map(|_| ())
    }

    async fn all(&self, ctx: &OpContext, collection: &str) -> StorageResult<Vec<Record>> {
        let collection = CollectionName::parse(collection)?;
        let records = self.records(&collection)?;

        ctx.run("all", async {
            let cursor = records
                .find(doc! {})
                .limit(DEFAULT_PAGE_LIMIT as i64)
                .await
                .map_err(|e| query_error("all", &collection, e))?;
            drain(cursor)
                .await
                .map_err(|e| query_error("all", &collection, e))
        })
        .await
    }

    async fn find_by_field(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<Vec<Record>> {
        let collection = CollectionName::parse(collection)?;
        let field = RecordField::parse(field)?;
        let records = self.records(&collection)?;

        ctx.run("find_by_field", async {
            let cursor = records
                .find(field_filter(field, value))
                .await
                .map_err(|e| query_error("find_by_field", &collection, e))?;
            drain(cursor)
                .await
                .map_err(|e| query_error("find_by_field", &collection, e))
        })
        .await
    }

    async fn insert_record(
        &self,
        ctx: &OpContext,
        collection: &str,
        record: Record,
    ) -> StorageResult<Record> {
        let collection = CollectionName::parse(collection)?;
        record.validate()?;
        let records = self.records(&collection)?;

        ctx.run("insert", async {
            records
                .insert_one(&record)
                .await
                .map_err(|e| write_error("insert", &collection, e))
        })
        .await?;

        debug!(collection = %collection, id = %record.id, "Inserted document");
        Ok(record)
    }

    /// Deletes in passes: find the matching ids, delete exactly those, then
    /// query again. Stops when a pass finds nothing or after
    /// `max_delete_passes` passes.
    async fn delete(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<u64> {
        let collection = CollectionName::parse(collection)?;
        let field = RecordField::parse(field)?;
        let records = self.records(&collection)?;
        let max_passes = self.config().max_delete_passes;

        let mut removed = 0u64;
        for pass in 1..=max_passes {
            let ids = self
                .matching_ids(ctx, &collection, field_filter(field, value))
                .await?;
            if ids.is_empty() {
                debug!(collection = %collection, %field, removed, passes = pass, "Deleted documents");
                return Ok(removed);
            }

            let result = ctx
                .run("delete", async {
                    records
                        .delete_many(delete_filter(ids, field, value))
                        .await
                        .map_err(|e| write_error("delete", &collection, e))
                })
                .await?;
            removed += result.deleted_count;
        }

        warn!(
            collection = %collection,
            %field,
            removed,
            max_passes,
            "Delete stopped after reaching the pass limit; matching documents may remain"
        );
        Ok(removed)
    }
}
