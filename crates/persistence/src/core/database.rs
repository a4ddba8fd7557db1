//! The storage capability shared by every backend and by the orchestrator.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use crate::composite::{StatusReport, Tier, TierStatus, check_connected};
use crate::context::OpContext;
use crate::core::BackendKind;
use crate::error::StorageResult;
use crate::types::{InsertInput, Record};

/// Maximum number of records returned by [`Database::all`].
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// A shareable, type-erased database handle.
pub type DynDatabase = Arc<dyn Database>;

/// Uniform storage operations over a single record type.
///
/// Every backend starts disconnected. [`connect`](Database::connect) is called
/// once at startup and [`close`](Database::close) at shutdown; any data
/// operation in between on a disconnected backend fails with
/// [`BackendError::NotConnected`](crate::error::BackendError::NotConnected).
///
/// Collection names are validated with
/// [`CollectionName::parse`](crate::types::CollectionName::parse) and field
/// names with [`RecordField::parse`](crate::types::RecordField::parse) by
/// every implementation, so the same input is rejected the same way no
/// matter which backend is configured.
///
/// # Example
///
/// ```
/// use bookshelf_persistence::backends::memory::MemoryBackend;
/// use bookshelf_persistence::core::Database;
/// use bookshelf_persistence::types::InsertInput;
/// use bookshelf_persistence::OpContext;
///
/// # tokio_test::block_on(async {
/// let db = MemoryBackend::new();
/// let ctx = OpContext::new();
/// db.connect(&ctx).await.unwrap();
///
/// let record = db
///     .insert(&ctx, "books", InsertInput::new("Fictions", "Jorge Luis Borges"))
///     .await
///     .unwrap();
/// let found = db.find_by_field(&ctx, "books", "id", &record.id).await.unwrap();
/// assert_eq!(found, vec![record]);
/// # });
/// ```
#[async_trait]
pub trait Database: Send + Sync + Debug {
    /// Stable identifier used for diagnostics and registry dispatch.
    fn kind(&self) -> BackendKind;

    /// Establishes the underlying client. Calling it again on a connected
    /// backend is a no-op.
    async fn connect(&self, ctx: &OpContext) -> StorageResult<()>;

    /// Releases the underlying client. Idempotent.
    async fn close(&self) -> StorageResult<()>;

    /// Liveness check. Never mutates state and never fails: any error is
    /// reported as `false`.
    async fn is_connected(&self, ctx: &OpContext) -> bool;

    /// Ensures the durable structure exists. No-op for schemaless backends.
    async fn setup(&self, ctx: &OpContext) -> StorageResult<()>;

    /// Returns up to [`DEFAULT_PAGE_LIMIT`] records in backend-native order.
    async fn all(&self, ctx: &OpContext, collection: &str) -> StorageResult<Vec<Record>>;

    /// Equality filter on one field. The field name is matched
    /// case-insensitively, the value exactly. No match is an empty result.
    async fn find_by_field(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<Vec<Record>>;

    /// Validates the input, assigns a fresh id and persists the record.
    async fn insert(
        &self,
        ctx: &OpContext,
        collection: &str,
        input: InsertInput,
    ) -> StorageResult<Record> {
        input.validate()?;
        let record = Record::from_input(input);
        self.insert_record(ctx, collection, record).await
    }

    /// Persists a record whose id has already been assigned.
    async fn insert_record(
        &self,
        ctx: &OpContext,
        collection: &str,
        record: Record,
    ) -> StorageResult<Record>;

    /// Removes every record whose field equals `value` and returns how many
    /// were removed.
    async fn delete(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<u64>;

    /// Connectivity report for this backend as the only (primary) tier.
    async fn status(&self, ctx: &OpContext) -> StatusReport {
        let connected = check_connected(self, ctx).await;
        StatusReport::from_tiers(vec![TierStatus::new(Tier::Primary, self.kind(), connected)])
    }
}
