//! Sensor readings service: HTTP access to a time-series table of readings in PostgreSQL.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod reading;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{DatabaseSettings, Settings};
pub use error::{AppError, ConfigError};
pub use reading::{Reading, SensorColumn};
pub use routes::{app_router, common_routes, reading_routes};
pub use service::{PgReadingStore, ReadingStore};
pub use sql::TableName;
pub use state::AppState;
pub use store::{connect, ensure_database_exists, ensure_readings_table};
