//! DualWriteStorage implementation.
//!
//! # Overview
//!
//! `DualWriteStorage` implements [`Database`] by delegating to a required
//! primary backend and an optional secondary backend:
//!
//! - **Inserts**: fanned out to both tiers concurrently; the primary's result
//!   is returned
//! - **Reads and deletes**: primary only; the secondary is never read
//!
//! A failed secondary write is logged as a [`PartialWriteError`] and never
//! changes what the caller sees.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use bookshelf_persistence::backends::memory::MemoryBackend;
//! use bookshelf_persistence::composite::DualWriteStorage;
//! use bookshelf_persistence::core::Database;
//! use bookshelf_persistence::types::InsertInput;
//! use bookshelf_persistence::OpContext;
//!
//! # tokio_test::block_on(async {
//! let primary = Arc::new(MemoryBackend::new());
//! let secondary = Arc::new(MemoryBackend::new());
//! let ctx = OpContext::new();
//!
//! let storage = DualWriteStorage::start(&ctx, primary.clone(), Some(secondary.clone())).await;
//! let record = storage
//!     .insert(&ctx, "books", InsertInput::new("Fictions", "Jorge Luis Borges"))
//!     .await
//!     .unwrap();
//!
//! // Both tiers hold the same record, with the same id.
//! let mirrored = secondary.find_by_field(&ctx, "books", "id", &record.id).await.unwrap();
//! assert_eq!(mirrored, vec![record]);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::context::OpContext;
use crate::core::{BackendKind, Database, DynDatabase};
use crate::error::{BackendError, PartialWriteError, StorageError, StorageResult};
use crate::types::{CollectionName, InsertInput, Record};

use super::health::{
    DEFAULT_CHECK_TIMEOUT, StatusReport, Tier, TierHealth, TierStatus, check_isolated,
};

type SharedHealth = Arc<RwLock<HashMap<Tier, TierHealth>>>;

/// Result of one tier's write, sent back to the joining caller.
struct WriteOutcome {
    tier: Tier,
    kind: BackendKind,
    result: StorageResult<Record>,
}

/// Storage that mirrors writes to an optional secondary backend.
///
/// Implements [`Database`] itself, so callers cannot tell a wrapped backend
/// from a plain one.
#[derive(Debug)]
pub struct DualWriteStorage {
    primary: DynDatabase,
    secondary: Option<DynDatabase>,
    health: SharedHealth,
    check_timeout: Duration,
}

impl DualWriteStorage {
    /// Composes already-connected backends.
    pub fn new(primary: DynDatabase, secondary: Option<DynDatabase>) -> Self {
        let mut health = HashMap::from([(Tier::Primary, TierHealth::default())]);
        if secondary.is_some() {
            health.insert(Tier::Secondary, TierHealth::default());
        }

        Self {
            primary,
            secondary,
            health: Arc::new(RwLock::new(health)),
            check_timeout: DEFAULT_CHECK_TIMEOUT,
        }
    }

    /// Sets the upper bound for each tier's connectivity check.
    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = timeout;
        self
    }

    /// Composes the backends, then connects and sets up both tiers.
    ///
    /// Never fails. A secondary that cannot start is logged and left in
    /// place; a primary that cannot start leaves the storage degraded, which
    /// the status report shows.
    pub async fn start(ctx: &OpContext, primary: DynDatabase, secondary: Option<DynDatabase>) -> Self {
        let storage = Self::new(primary, secondary);

        match start_tier(ctx, &storage.primary).await {
            Ok(()) => info!(backend = %storage.primary.kind(), "Primary backend ready"),
            Err(e) => {
                storage.record(Tier::Primary, Err(&e));
                error!(
                    backend = %storage.primary.kind(),
                    error = %e,
                    "Primary backend failed to start; serving in degraded mode"
                );
            }
        }

        if let Some(secondary) = &storage.secondary {
            match start_tier(ctx, secondary).await {
                Ok(()) => info!(backend = %secondary.kind(), "Secondary backend ready"),
                Err(e) => {
                    storage.record(Tier::Secondary, Err(&e));
                    warn!(
                        backend = %secondary.kind(),
                        error = %e,
                        "Secondary backend failed to start; writes will not be mirrored"
                    );
                }
            }
        }

        storage
    }

    pub fn primary(&self) -> &DynDatabase {
        &self.primary
    }

    pub fn secondary(&self) -> Option<&DynDatabase> {
        self.secondary.as_ref()
    }

    /// Snapshot of the call-outcome bookkeeping for `tier`.
    pub fn tier_health(&self, tier: Tier) -> Option<TierHealth> {
        self.health.read().get(&tier).cloned()
    }

    fn record(&self, tier: Tier, result: Result<(), &StorageError>) {
        record_outcome(&self.health, tier, result);
    }

    /// Runs a primary-only operation and records its outcome.
    async fn on_primary<T, F>(&self, fut: F) -> StorageResult<T>
    where
        F: std::future::Future<Output = StorageResult<T>>,
    {
        let result = fut.await;
        // Caller mistakes say nothing about backend health.
        match &result {
            Err(e) if e.is_client_error() => {}
            other => self.record(Tier::Primary, other.as_ref().map(|_| ())),
        }
        result
    }
}

async fn start_tier(ctx: &OpContext, db: &DynDatabase) -> StorageResult<()> {
    db.connect(ctx).await?;
    db.setup(ctx).await
}

fn record_outcome<T>(health: &SharedHealth, tier: Tier, result: Result<T, &StorageError>) {
    let mut health = health.write();
    let entry = health.entry(tier).or_default();
    match result {
        Ok(_) => entry.record_success(tier),
        Err(e) => entry.record_failure(e.to_string()),
    }
}

/// Logs the outcome of a write nobody is waiting for any more.
fn log_unawaited(collection: &str, outcome: &WriteOutcome) {
    match &outcome.result {
        Ok(record) => info!(
            tier = %outcome.tier,
            backend = %outcome.kind,
            collection,
            id = %record.id,
            "Write completed after the caller stopped waiting"
        ),
        Err(e) => warn!(
            tier = %outcome.tier,
            backend = %outcome.kind,
            collection,
            error = %e,
            "Write failed after the caller stopped waiting"
        ),
    }
}

#[async_trait]
impl Database for DualWriteStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::DualWrite
    }

    async fn connect(&self, ctx: &OpContext) -> StorageResult<()> {
        if let Some(secondary) = &self.secondary {
            if let Err(e) = secondary.connect(ctx).await {
                warn!(backend = %secondary.kind(), error = %e, "Secondary backend failed to connect");
            }
        }
        self.primary.connect(ctx).await
    }

    async fn close(&self) -> StorageResult<()> {
        if let Some(secondary) = &self.secondary {
            if let Err(e) = secondary.close().await {
                warn!(backend = %secondary.kind(), error = %e, "Secondary backend failed to close");
            }
        }
        self.primary.close().await
    }

    async fn is_connected(&self, ctx: &OpContext) -> bool {
        self.primary.is_connected(ctx).await
    }

    async fn setup(&self, ctx: &OpContext) -> StorageResult<()> {
        if let Some(secondary) = &self.secondary {
            if let Err(e) = secondary.setup(ctx).await {
                warn!(backend = %secondary.kind(), error = %e, "Secondary backend setup failed");
            }
        }
        self.primary.setup(ctx).await
    }

    #[instrument(skip(self, ctx), fields(collection = %collection))]
    async fn all(&self, ctx: &OpContext, collection: &str) -> StorageResult<Vec<Record>> {
        self.on_primary(self.primary.all(ctx, collection)).await
    }

    #[instrument(skip(self, ctx, value), fields(collection = %collection, field = %field))]
    async fn find_by_field(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<Vec<Record>> {
        self.on_primary(self.primary.find_by_field(ctx, collection, field, value))
            .await
    }

    #[instrument(skip(self, ctx, input), fields(collection = %collection))]
    async fn insert(
        &self,
        ctx: &OpContext,
        collection: &str,
        input: InsertInput,
    ) -> StorageResult<Record> {
        input.validate()?;
        CollectionName::parse(collection)?;
        let record = Record::from_input(input);
        self.insert_record(ctx, collection, record).await
    }

    /// Writes `record` to every tier concurrently and returns the primary's
    /// result.
    ///
    /// Each tier's write runs on its own task with a child of `ctx`, so both
    /// honour the caller's deadline and cancellation independently. If the
    /// caller's context ends before the primary reports, this returns
    /// `Cancelled` or `DeadlineExceeded` immediately. If only the secondary
    /// is still outstanding, that counts as a secondary failure and the
    /// primary's record is returned. Writes still in flight log their own
    /// outcome.
    async fn insert_record(
        &self,
        ctx: &OpContext,
        collection: &str,
        record: Record,
    ) -> StorageResult<Record> {
        CollectionName::parse(collection)?;
        record.validate()?;
        ctx.check("insert")?;

        let mut targets = vec![(Tier::Primary, Arc::clone(&self.primary))];
        if let Some(secondary) = &self.secondary {
            targets.push((Tier::Secondary, Arc::clone(secondary)));
        }

        let launched = targets.len();
        let (tx, mut rx) = mpsc::channel::<WriteOutcome>(launched);

        for (tier, db) in targets {
            let tx = tx.clone();
            let ctx = ctx.child();
            let collection = collection.to_string();
            let record = record.clone();
            let health = Arc::clone(&self.health);

            tokio::spawn(async move {
                let kind = db.kind();
                let result = db.insert_record(&ctx, &collection, record).await;
                record_outcome(&health, tier, result.as_ref());

                let outcome = WriteOutcome { tier, kind, result };
                if let Err(mpsc::error::SendError(outcome)) = tx.send(outcome).await {
                    log_unawaited(&collection, &outcome);
                }
            });
        }
        drop(tx);

        let mut primary: Option<WriteOutcome> = None;
        let mut secondary: Option<WriteOutcome> = None;
        let mut secondary_missed: Option<StorageError> = None;
        let mut received = 0;

        while received < launched {
            let next = ctx
                .run("insert", async { Ok::<_, StorageError>(rx.recv().await) })
                .await;
            let outcome = match next {
                Ok(Some(outcome)) => outcome,
                // A task ended without reporting (panicked).
                Ok(None) => break,
                Err(stopped) => {
                    // Outcomes already sent still count.
                    while let Ok(outcome) = rx.try_recv() {
                        match outcome.tier {
                            Tier::Primary => primary = Some(outcome),
                            Tier::Secondary => secondary = Some(outcome),
                        }
                    }
                    if primary.is_none() {
                        return Err(stopped);
                    }
                    if secondary.is_none() {
                        secondary_missed = Some(stopped);
                    }
                    break;
                }
            };
            received += 1;
            match outcome.tier {
                Tier::Primary => primary = Some(outcome),
                Tier::Secondary => secondary = Some(outcome),
            }
        }

        let primary = primary.ok_or_else(|| {
            StorageError::from(BackendError::WriteFailed {
                backend_name: self.primary.kind().to_string(),
                operation: "insert".to_string(),
                collection: collection.to_string(),
                message: "write task ended without reporting a result".to_string(),
                source: None,
            })
        })?;

        let secondary_failure = match secondary {
            Some(WriteOutcome { kind, result: Err(e), .. }) => Some((kind, e)),
            Some(_) => None,
            None => self.secondary.as_ref().map(|db| {
                let e = secondary_missed.unwrap_or_else(|| {
                    StorageError::from(BackendError::WriteFailed {
                        backend_name: db.kind().to_string(),
                        operation: "insert".to_string(),
                        collection: collection.to_string(),
                        message: "write task ended without reporting a result".to_string(),
                        source: None,
                    })
                });
                (db.kind(), e)
            }),
        };

        match (&primary.result, secondary_failure) {
            (Ok(stored), Some((kind, e))) => {
                let partial = PartialWriteError {
                    primary: primary.kind,
                    secondary: kind,
                    collection: collection.to_string(),
                    record_id: stored.id.clone(),
                    source: e,
                };
                warn!(error = %partial, "Secondary write failed; primary write kept");
            }
            (Err(_), Some((kind, e))) => {
                warn!(backend = %kind, error = %e, "Secondary write failed");
            }
            _ => {}
        }

        match primary.result {
            Ok(stored) => {
                debug!(collection, id = %stored.id, "Inserted record");
                Ok(stored)
            }
            Err(e) => {
                error!(backend = %primary.kind, collection, error = %e, "Primary write failed");
                Err(e)
            }
        }
    }

    #[instrument(skip(self, ctx, value), fields(collection = %collection, field = %field))]
    async fn delete(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<u64> {
        self.on_primary(self.primary.delete(ctx, collection, field, value))
            .await
    }

    async fn status(&self, ctx: &OpContext) -> StatusReport {
        let primary = check_isolated(Arc::clone(&self.primary), ctx, Tier::Primary, self.check_timeout);
        let secondary = async {
            match &self.secondary {
                Some(db) => Some(
                    check_isolated(Arc::clone(db), ctx, Tier::Secondary, self.check_timeout).await,
                ),
                None => None,
            }
        };
        let (primary_connected, secondary_connected) = tokio::join!(primary, secondary);

        let health = self.health.read().clone();
        let status = |tier: Tier, kind: BackendKind, connected: bool| {
            let status = TierStatus::new(tier, kind, connected);
            match health.get(&tier) {
                Some(h) => status.with_health(h),
                None => status,
            }
        };

        let mut tiers = vec![status(Tier::Primary, self.primary.kind(), primary_connected)];
        if let (Some(db), Some(connected)) = (&self.secondary, secondary_connected) {
            tiers.push(status(Tier::Secondary, db.kind(), connected));
        }

        StatusReport::from_tiers(tiers)
    }
}
