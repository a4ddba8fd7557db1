//! [`Database`] implementation for PostgreSQL.

use async_trait::async_trait;
use tokio_postgres::Row;
use tracing::{debug, warn};

use crate::context::OpContext;
use crate::core::{BackendKind, DEFAULT_PAGE_LIMIT, Database};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::types::{CollectionName, Record, RecordField};

use super::PostgresBackend;
use super::schema;

const SELECT_COLUMNS: &str = "id, title, author";

fn row_to_record(row: &Row) -> StorageResult<Record> {
    let decode = |e: tokio_postgres::Error| {
        StorageError::from(BackendError::SerializationError {
            backend_name: BackendKind::Postgres.to_string(),
            message: e.to_string(),
        })
    };
    Ok(Record {
        id: row.try_get(0).map_err(decode)?,
        title: row.try_get(1).map_err(decode)?,
        author: row.try_get(2).map_err(decode)?,
    })
}

fn query_error(operation: &str, table: &CollectionName, err: tokio_postgres::Error) -> StorageError {
    BackendError::query(BackendKind::Postgres, operation, table.as_str(), err).into()
}

fn write_error(operation: &str, table: &CollectionName, err: tokio_postgres::Error) -> StorageError {
    BackendError::write(BackendKind::Postgres, operation, table.as_str(), err).into()
}

pub(crate) fn select_all_sql(table: &CollectionName) -> String {
    format!("SELECT {SELECT_COLUMNS} FROM {} LIMIT $1", table.as_str())
}

pub(crate) fn select_by_field_sql(table: &CollectionName, field: RecordField) -> String {
    format!(
        "SELECT {SELECT_COLUMNS} FROM {} WHERE {} = $1",
        table.as_str(),
        field.column()
    )
}

pub(crate) fn insert_sql(table: &CollectionName) -> String {
    format!(
        "INSERT INTO {} (id, title, author) VALUES ($1, $2, $3)",
        table.as_str()
    )
}

pub(crate) fn delete_sql(table: &CollectionName, field: RecordField) -> String {
    format!("DELETE FROM {} WHERE {} = $1", table.as_str(), field.column())
}

#[async_trait]
impl Database for PostgresBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn connect(&self, ctx: &OpContext) -> StorageResult<()> {
        self.open(ctx).await
    }

    async fn close(&self) -> StorageResult<()> {
        self.shutdown();
        Ok(())
    }

    async fn is_connected(&self, ctx: &OpContext) -> bool {
        match self.ping(ctx).await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "PostgreSQL ping failed");
                false
            }
        }
    }

    async fn setup(&self, ctx: &OpContext) -> StorageResult<()> {
        let client = self.get_client(ctx).await?;
        for name in &self.config().collections {
            let table = CollectionName::parse(name)?;
            schema::ensure_table(&client, ctx, &table).await?;
            debug!(table = %table, "Ensured table exists");
        }
        Ok(())
    }

    async fn all(&self, ctx: &OpContext, collection: &str) -> StorageResult<Vec<Record>> {
        let table = CollectionName::parse(collection)?;
        let client = self.get_client(ctx).await?;
        let sql = select_all_sql(&table);
        let limit = DEFAULT_PAGE_LIMIT as i64;

        let rows = ctx
            .run("all", async {
                client
                    .query(&sql, &[&limit])
                    .await
                    .map_err(|e| query_error("all", &table, e))
            })
            .await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn find_by_field(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<Vec<Record>> {
        let table = CollectionName::parse(collection)?;
        let field = RecordField::parse(field)?;
        let client = self.get_client(ctx).await?;
        let sql = select_by_field_sql(&table, field);

        let rows = ctx
            .run("find_by_field", async {
                client
                    .query(&sql, &[&value])
                    .await
                    .map_err(|e| query_error("find_by_field", &table, e))
            })
            .await?;

        rows.iter().map(row_to_record).collect()
    }

    async fn insert_record(
        &self,
        ctx: &OpContext,
        collection: &str,
        record: Record,
    ) -> StorageResult<Record> {
        let table = CollectionName::parse(collection)?;
        record.validate()?;
        let client = self.get_client(ctx).await?;
        let sql = insert_sql(&table);

        ctx.run("insert", async {
            client
                .execute(&sql, &[&record.id, &record.title, &record.author])
                .await
                .map_err(|e| write_error("insert", &table, e))
        })
        .await?;

        debug!(table = %table, id = %record.id, "Inserted record");
        Ok(record)
    }

    async fn delete(
        &self,
        ctx: &OpContext,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StorageResult<u64> {
        let table = CollectionName::parse(collection)?;
        let field = RecordField::parse(field)?;
        let client = self.get_client(ctx).await?;
        let sql = delete_sql(&table, field);

        let removed = ctx
            .run("delete", async {
                client
                    .execute(&sql, &[&value])
                    .await
                    .map_err(|e| write_error("delete", &table, e))
            })
            .await;

        match removed {
            Ok(removed) => {
                debug!(table = %table, %field, removed, "Deleted records");
                Ok(removed)
            }
            Err(e) => {
                warn!(table = %table, %field, error = %e, "Delete failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books() -> CollectionName {
        CollectionName::parse("books").unwrap()
    }

    #[test]
    fn test_select_all_sql_uses_limit_parameter() {
        assert_eq!(
            select_all_sql(&books()),
            "SELECT id, title, author FROM books LIMIT $1"
        );
    }

    #[test]
    fn test_field_sql_uses_canonical_column() {
        let field = RecordField::parse("AUTHOR").unwrap();
        assert_eq!(
            select_by_field_sql(&books(), field),
            "SELECT id, title, author FROM books WHERE author = $1"
        );
        assert_eq!(
            delete_sql(&books(), RecordField::Title),
            "DELETE FROM books WHERE title = $1"
        );
    }

    #[test]
    fn test_insert_sql_binds_every_value() {
        assert_eq!(
            insert_sql(&books()),
            "INSERT INTO books (id, title, author) VALUES ($1, $2, $3)"
        );
    }
}
