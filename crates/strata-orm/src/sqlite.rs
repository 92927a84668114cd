//! SQLite driver over sqlx.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, TypeInfo, ValueRef};
use strata_sql::{QueryContext, SqlValue};

use crate::driver::{Driver, QueryOutput};
use crate::error::Result;
use crate::model::Row;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Runs expressions on a [`SqlitePool`].
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    pool: SqlitePool,
}

impl SqliteDriver {
    /// Creates a driver on an existing pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to `url`, e.g. `sqlite::memory:`.
    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(SqlitePool::connect(url).await?))
    }

    /// Returns the pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Binds a SqlValue parameter to a raw query.
fn bind_param<'q>(query: SqliteQuery<'q>, value: SqlValue) -> SqliteQuery<'q> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(b),
        SqlValue::Int(i) => query.bind(i),
        SqlValue::Float(f) => query.bind(f),
        SqlValue::Text(s) => query.bind(s),
        SqlValue::Blob(b) => query.bind(b),
        SqlValue::Timestamp(ts) => query.bind(ts),
    }
}

/// Decodes a row by the storage class of each value.
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut decoded = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get::<i64, _>(index)?),
                "REAL" | "NUMERIC" => Value::from(row.try_get::<f64, _>(index)?),
                "BLOB" => Value::from(row.try_get::<Vec<u8>, _>(index)?),
                _ => Value::String(row.try_get::<String, _>(index)?),
            }
        };
        decoded.insert(String::from(column.name()), value);
    }
    Ok(decoded)
}

impl Driver for SqliteDriver {
    fn execute<'a>(
        &'a self,
        expression: &'a str,
        bindings: &'a [SqlValue],
        context: QueryContext,
    ) -> BoxFuture<'a, Result<QueryOutput>> {
        async move {
            let mut query = sqlx::query(expression);
            for value in bindings {
                query = bind_param(query, value.clone());
            }

            if context.returns_rows() {
                let rows = query.fetch_all(&self.pool).await?;
                let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
                Ok(QueryOutput::Rows(rows))
            } else {
                let result = query.execute(&self.pool).await?;
                Ok(QueryOutput::Affected {
                    rows: result.rows_affected(),
                    last_insert_id: (context == QueryContext::Insert)
                        .then(|| result.last_insert_rowid()),
                })
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_driver() -> SqliteDriver {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");
        SqliteDriver::new(pool)
    }

    #[tokio::test]
    async fn test_insert_then_select() {
        let driver = create_test_driver().await;
        driver
            .execute(
                "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT, score REAL, data BLOB)",
                &[],
                QueryContext::Schema,
            )
            .await
            .unwrap();

        let inserted = driver
            .execute(
                "INSERT INTO notes (body, score, data) VALUES (?, ?, ?)",
                &[
                    SqlValue::Text(String::from("hello")),
                    SqlValue::Float(1.5),
                    SqlValue::Blob(vec![1, 2]),
                ],
                QueryContext::Insert,
            )
            .await
            .unwrap();
        assert_eq!(inserted.rows_affected(), 1);
        assert_eq!(inserted.last_insert_id(), Some(1));

        let rows = driver
            .execute(
                "SELECT id, body, score, data, NULL AS absent FROM notes WHERE id = ?",
                &[SqlValue::Int(1)],
                QueryContext::Select,
            )
            .await
            .unwrap()
            .into_rows()
            .unwrap();
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({"id": 1, "body": "hello", "score": 1.5, "data": [1, 2], "absent": null})
        );
    }
}
