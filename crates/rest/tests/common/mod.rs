//! Shared helpers for HTTP-level tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use bookshelf_persistence::OpContext;
use bookshelf_persistence::backends::memory::MemoryBackend;
use bookshelf_persistence::core::{BackendKind, Database};
use bookshelf_persistence::error::StorageResult;
use bookshelf_persistence::types::Record;
use bookshelf_rest::{ServerConfig, create_app_with_config};

pub const BORGES: &str = "Jorge Luis Borges";

pub fn seed_records() -> Vec<Record> {
    vec![
        Record::new("1", "Fictions", BORGES),
        Record::new("2", "The Aleph", BORGES),
        Record::new("3", "Fictions", "John Smith"),
    ]
}

/// A connected memory backend holding [`seed_records`] in `books`.
pub async fn seeded_memory() -> Arc<MemoryBackend> {
    let db = MemoryBackend::with_seed(HashMap::from([("books".to_string(), seed_records())]));
    db.connect(&OpContext::new())
        .await
        .expect("memory backend connects");
    Arc::new(db)
}

pub fn test_config() -> ServerConfig {
    ServerConfig {
        port: 8080,
        ..ServerConfig::for_testing()
    }
}

pub fn server_for<S>(storage: Arc<S>, config: ServerConfig) -> TestServer
where
    S: Database + 'static,
{
    let app = create_app_with_config(storage, config);
    TestServer::new(app).expect("Failed to create test server")
}

/// A backend whose reads never finish unless the context gives up first.
#[derive(Debug, Default)]
pub struct StalledBackend;

#[async_trait]
impl Database for StalledBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn connect(&self, _ctx: &OpContext) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn is_connected(&self, _ctx: &OpContext) -> bool {
        true
    }

    async fn setup(&self, _ctx: &OpContext) -> StorageResult<()> {
        Ok(())
    }

    async fn all(&self, ctx: &OpContext, _collection: &str) -> StorageResult<Vec<Record>> {
        ctx.run("all", async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Vec::new())
        })
        .await
    }

    async fn find_by_field(
        &self,
        ctx: &OpContext,
        collection: &str,
        _field: &str,
        _value: &str,
    ) -> StorageResult<Vec<Record>> {
        self.all(ctx, collection).await
    }

    async fn insert_record(
        &self,
        _ctx: &OpContext,
        _collection: &str,
        record: Record,
    ) -> StorageResult<Record> {
        Ok(record)
    }

    async fn delete(
        &self,
        _ctx: &OpContext,
        _collection: &str,
        _field: &str,
        _value: &str,
    ) -> StorageResult<u64> {
        Ok(0)
    }
}
