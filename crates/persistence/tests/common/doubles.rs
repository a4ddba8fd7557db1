//! Fault-injecting [`Database`] implementations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use bookshelf_persistence::OpContext;
use bookshelf_persistence::backends::memory::MemoryBackend;
use bookshelf_persistence::core::{BackendKind, Database};
use bookshelf_persistence::error::{BackendError, StorageError, StorageResult};
use bookshelf_persistence::types::Record;

/// How a [`FaultyBackend`] misbehaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    /// Behaves like the wrapped memory backend.
    #[default]
    None,
    /// Every write fails with a backend error.
    FailWrites,
    /// Every write waits this long before touching the store, honouring
    /// the context.
    SlowWrites(Duration),
    /// Every write waits this long ignoring the context, like a driver that
    /// cannot be interrupted.
    StuckWrites(Duration),
    /// Every write panics inside the backend.
    PanicOnWrite,
    /// `connect` fails.
    FailConnect,
    /// The connectivity check panics.
    PanicOnCheck,
    /// The connectivity check never returns.
    HangOnCheck,
}

/// A memory backend with injected faults, reporting a configurable kind.
#[derive(Debug)]
pub struct FaultyBackend {
    inner: MemoryBackend,
    kind: BackendKind,
    fault: Fault,
    write_attempts: AtomicUsize,
}

impl FaultyBackend {
    pub fn new(kind: BackendKind, fault: Fault) -> Self {
        Self {
            inner: MemoryBackend::new(),
            kind,
            fault,
            write_attempts: AtomicUsize::new(0),
        }
    }

    /// Shared handle, already connected unless the fault prevents it.
    pub async fn connected(kind: BackendKind, fault: Fault) -> Arc<Self> {
        let db = Arc::new(Self::new(kind, fault));
        let _ = db.connect(&OpContext::new()).await;
        db
    }

    /// Number of `insert_record` calls received.
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Number of records stored in `collection`.
    pub fn stored(&self, collection: &str) -> usize {
        self.inner.len(collection)
    }

    fn injected(&self, operation: &str, collection: &str) -> BackendError {
        BackendError::WriteFailed {
            backend_name: self.kind.to_string(),
            operation: operation.to_string(),
            collection: collection.to_string(),
            message: "injected failure".to_string(),
            source: None,
        }
    }
}

#[async_trait]
impl Database for FaultyBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn connect(&self, ctx: &OpContext) -> StorageResult<()> {
        if self.fault == Fault::FailConnect {
            return Err(BackendError::ConnectionFailed {
                backend_name: self.kind.to_string(),
                message: "injected connect failure".to_string(),
                source: None,
            }
            .into());
        }
        self.inner.connect(ctx).await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }

    async fn is_connected(&self, ctx: &OpContext) -> bool {
        match self.fault {
            Fault::PanicOnCheck => panic!("injected check panic"),
            Fault::HangOnCheck => std::future::pending::<bool>().await,
            _ => self.inner.is_connected(ctx).await,
        }
    }

    async fn setup(&self, ctx: &OpContext) -> StorageResult<()> {
        self.inner.setup(ctx).await
    }

    async fn all(&self, ctx: &OpContext, collection: &str) -> StorageResult<Vec<Record>> {
        self.inner.all(ctx, collection).await
    }

    async fn find_by_field(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<Vec<Record>> {
        self.inner.find_by_field(ctx, collection, field, value).await
    }

    async fn insert_record(
        &self,
        ctx: &OpContext,
        collection: &str,
        record: Record,
    ) -> StorageResult<Record> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        match self.fault {
            Fault::FailWrites => Err(self.injected("insert", collection).into()),
            Fault::PanicOnWrite => panic!("injected write panic"),
            Fault::SlowWrites(delay) => {
                ctx.run("insert", async {
                    tokio::time::sleep(delay).await;
                    Ok::<_, StorageError>(())
                })
                .await?;
                self.inner.insert_record(ctx, collection, record).await
            }
            Fault::StuckWrites(delay) => {
                tokio::time::sleep(delay).await;
                self.inner.insert_record(ctx, collection, record).await
            }
            _ => self.inner.insert_record(ctx, collection, record).await,
        }
    }

    async fn delete(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<u64> {
        if self.fault == Fault::FailWrites {
            return Err(self.injected("delete", collection).into());
        }
        self.inner.delete(ctx, collection, field, value).await
    }
}
