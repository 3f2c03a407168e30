//! In-memory `ReadingStore` for router tests. Mirrors the SQL semantics of `PgReadingStore`.

use super::ReadingStore;
use crate::error::AppError;
use crate::reading::{Reading, SensorColumn};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Reading>>,
    broken: bool,
}

impl MemoryStore {
    pub fn with_rows(rows: Vec<Reading>) -> Self {
        MemoryStore {
            rows: Mutex::new(rows.iter().map(Reading::normalized).collect()),
            broken: false,
        }
    }

    /// Every call fails as if the database were unreachable.
    pub fn broken() -> Self {
        MemoryStore {
            rows: Mutex::default(),
            broken: true,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.broken {
            return Err(AppError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn newest_first(&self, keep: impl Fn(&Reading) -> bool) -> Vec<Reading> {
        let mut rows: Vec<Reading> = self.rows.lock().unwrap().iter().filter(|r| keep(r)).cloned().collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows
    }
}

#[async_trait]
impl ReadingStore for MemoryStore {
    async fn insert(&self, reading: &Reading) -> Result<Reading, AppError> {
        self.check()?;
        let stored = reading.normalized();
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|r| r.timestamp == stored.timestamp) {
            return Err(AppError::Conflict(format!("a reading at {} already exists", stored.timestamp)));
        }
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn list_recent(&self, skip: u64, limit: Option<u64>) -> Result<Vec<Reading>, AppError> {
        self.check()?;
        let rows = self.newest_first(|_| true).into_iter().skip(skip as usize);
        Ok(match limit.filter(|n| *n > 0) {
            Some(n) => rows.take(n as usize).collect(),
            None => rows.collect(),
        })
    }

    async fn list_by_time_range(
        &self,
        earliest: Option<NaiveDateTime>,
        latest: Option<NaiveDateTime>,
    ) -> Result<Vec<Reading>, AppError> {
        self.check()?;
        Ok(self.newest_first(|r| {
            earliest.map_or(true, |e| r.timestamp >= e) && latest.map_or(true, |l| r.timestamp < l)
        }))
    }

    async fn list_by_sensor_range(
        &self,
        column: SensorColumn,
        lowest: Option<f64>,
        highest: Option<f64>,
    ) -> Result<Vec<Reading>, AppError> {
        self.check()?;
        if lowest.is_none() && highest.is_none() {
            return Ok(self.newest_first(|_| true));
        }
        // NULL never satisfies a comparison.
        Ok(self.newest_first(|r| match column.value_of(r) {
            Some(v) => lowest.map_or(true, |lo| v >= lo) && highest.map_or(true, |hi| v < hi),
            None => false,
        }))
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check()
    }
}
