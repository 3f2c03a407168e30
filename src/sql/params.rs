//! Values bound to query placeholders.

use crate::reading::{round_one_decimal, SQL_TIMESTAMP_FORMAT};
use chrono::{Duration, NaiveDateTime, Timelike};
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// A value that can be bound to a PostgreSQL query.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    /// `YYYY-MM-DD HH:MM:SS[.ffffff]`; its placeholder carries a `::timestamp` cast.
    Timestamp(String),
    F64(f64),
    I64(i64),
}

impl PgBindValue {
    pub fn timestamp(ts: NaiveDateTime) -> Self {
        PgBindValue::Timestamp(ts.format(SQL_TIMESTAMP_FORMAT).to_string())
    }

    /// Range bound keeping its fractional seconds. Rounded up to whole microseconds,
    /// the store's precision, so `>=` and `<` select the same rows as the exact bound.
    pub fn timestamp_bound(ts: NaiveDateTime) -> Self {
        let sub_micro = i64::from(ts.nanosecond() % 1_000);
        let ts = if sub_micro == 0 {
            ts
        } else {
            ts + Duration::nanoseconds(1_000 - sub_micro)
        };
        PgBindValue::Timestamp(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }

    /// Sensor value as written to the store.
    pub fn sensor(value: f64) -> Self {
        PgBindValue::F64(round_one_decimal(value))
    }

    /// Placeholder text for parameter number `n`.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            PgBindValue::Timestamp(_) => format!("${}::timestamp", n),
            PgBindValue::F64(_) | PgBindValue::I64(_) => format!("${}", n),
        }
    }

    pub fn bind<'q>(&'q self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            PgBindValue::Timestamp(s) => query.bind(s.as_str()),
            PgBindValue::F64(v) => query.bind(*v),
            PgBindValue::I64(v) => query.bind(*v),
        }
    }
}
