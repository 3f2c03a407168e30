//! Reading queries executed against PostgreSQL.

use crate::error::AppError;
use crate::reading::{Reading, SensorColumn};
use crate::sql::{insert, select_by_sensor_range, select_by_time_range, select_recent, QueryBuf, TableName};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::{PgArguments, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{PgPool, Row};

/// Storage seam used by the HTTP handlers.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Insert one reading. Returns it as stored (rounded, whole seconds).
    /// A second reading at the same timestamp fails with `AppError::Conflict`.
    async fn insert(&self, reading: &Reading) -> Result<Reading, AppError>;

    /// Newest first, skipping `skip` rows and capping at `limit` (zero means no cap).
    async fn list_recent(&self, skip: u64, limit: Option<u64>) -> Result<Vec<Reading>, AppError>;

    /// Rows with `earliest <= timestamp < latest`; either bound may be absent.
    async fn list_by_time_range(
        &self,
        earliest: Option<NaiveDateTime>,
        latest: Option<NaiveDateTime>,
    ) -> Result<Vec<Reading>, AppError>;

    /// Rows with `lowest <= column < highest`, newest first.
    async fn list_by_sensor_range(
        &self,
        column: SensorColumn,
        lowest: Option<f64>,
        highest: Option<f64>,
    ) -> Result<Vec<Reading>, AppError>;

    /// Round-trip to the store, for readiness checks.
    async fn ping(&self) -> Result<(), AppError>;
}

/// `ReadingStore` over a connection pool. Each call borrows one connection for one statement.
#[derive(Clone)]
pub struct PgReadingStore {
    pool: PgPool,
    table: TableName,
}

impl PgReadingStore {
    pub fn new(pool: PgPool, table: TableName) -> Self {
        PgReadingStore { pool, table }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    async fn query_many(&self, q: &QueryBuf) -> Result<Vec<Reading>, AppError> {
        let rows = bind_all(q).fetch_all(&self.pool).await?;
        let readings = rows.iter().map(row_to_reading).collect::<Result<Vec<_>, _>>()?;
        Ok(readings)
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn insert(&self, reading: &Reading) -> Result<Reading, AppError> {
        let q = insert(&self.table, reading);
        bind_all(&q).execute(&self.pool).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("a reading at {} already exists", reading.timestamp))
            } else {
                AppError::Db(e)
            }
        })?;
        Ok(reading.normalized())
    }

    async fn list_recent(&self, skip: u64, limit: Option<u64>) -> Result<Vec<Reading>, AppError> {
        self.query_many(&select_recent(&self.table, skip, limit)).await
    }

    async fn list_by_time_range(
        &self,
        earliest: Option<NaiveDateTime>,
        latest: Option<NaiveDateTime>,
    ) -> Result<Vec<Reading>, AppError> {
        self.query_many(&select_by_time_range(&self.table, earliest, latest)).await
    }

    async fn list_by_sensor_range(
        &self,
        column: SensorColumn,
        lowest: Option<f64>,
        highest: Option<f64>,
    ) -> Result<Vec<Reading>, AppError> {
        self.query_many(&select_by_sensor_range(&self.table, column, lowest, highest))
            .await
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Logs the statement and binds its parameters in placeholder order.
fn bind_all(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    q.params.iter().fold(sqlx::query(&q.sql), |query, p| p.bind(query))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|d| d.is_unique_violation())
        .unwrap_or(false)
}

/// Positional: 0 → timestamp, 1 → temperature, 2 → humidity.
fn row_to_reading(row: &PgRow) -> Result<Reading, sqlx::Error> {
    Ok(Reading {
        timestamp: row.try_get::<NaiveDateTime, _>(0)?,
        temperature: row.try_get::<Option<f64>, _>(1)?,
        humidity: row.try_get::<Option<f64>, _>(2)?,
    })
}
