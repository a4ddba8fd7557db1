//! PostgreSQL schema definitions.

use crate::context::OpContext;
use crate::core::BackendKind;
use crate::error::{BackendError, StorageError, StorageResult};
use crate::types::CollectionName;

/// DDL for one collection table.
pub(crate) fn create_table_sql(table: &CollectionName) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id TEXT PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            author VARCHAR(255) NOT NULL
        )",
        table.as_str()
    )
}

/// Creates the table for `table` if it does not exist.
pub(crate) async fn ensure_table(
    client: &deadpool_postgres::Client,
    ctx: &OpContext,
    table: &CollectionName,
) -> StorageResult<()> {
    let sql = create_table_sql(table);
    ctx.run("setup", async {
        client
            .batch_execute(&sql)
            .await
            .map_err(|e| setup_error(table, e))
    })
    .await
}

fn setup_error(table: &CollectionName, err: tokio_postgres::Error) -> StorageError {
    StorageError::Backend(BackendError::SetupFailed {
        backend_name: BackendKind::Postgres.to_string(),
        collection: table.to_string(),
        message: format!("Failed to create table: {}", err),
        source: Some(Box::new(err)),
    })
}
