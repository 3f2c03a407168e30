//! Connection pool and readings-table bootstrap.

use crate::config::DatabaseSettings;
use crate::error::AppError;
use crate::sql::{create_table, TableName};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};

/// Build the pool. Connections are acquired per statement and returned when the query finishes or fails.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect_with(settings.connect.clone())
        .await?;
    tracing::info!(
        host = %settings.connect.get_host(),
        database = ?settings.connect.get_database(),
        max_connections = settings.max_connections,
        "connected to database"
    );
    Ok(pool)
}

/// Create the target database through the `postgres` maintenance database if it does not exist.
pub async fn ensure_database_exists(options: &PgConnectOptions) -> Result<(), AppError> {
    let db_name = match options.get_database() {
        Some(name) if !name.is_empty() && name != "postgres" => name.to_string(),
        _ => return Ok(()),
    };
    let mut conn = options.clone().database("postgres").connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Create the schema (if qualified) and the readings table if missing.
pub async fn ensure_readings_table(pool: &PgPool, table: &TableName) -> Result<(), AppError> {
    if let Some(schema) = table.schema() {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema)))
            .execute(pool)
            .await?;
    }
    sqlx::query(&create_table(table)).execute(pool).await?;
    tracing::info!(table = %table.qualified(), "readings table ready");
    Ok(())
}
