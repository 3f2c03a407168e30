//! Reading handlers: filtered listing and authenticated insert.

use crate::error::AppError;
use crate::extractors::ApiKey;
use crate::reading::{timestamp, Reading, SensorColumn};
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use chrono::NaiveDateTime;
use serde::Deserialize;

const DEFAULT_LIMIT: u64 = 10;

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

/// Query parameters of `GET /`.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub earliest: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub latest: Option<NaiveDateTime>,
    /// Checked against the sensor allow-list in `into_filter`.
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub lowest: Option<f64>,
    #[serde(default)]
    pub highest: Option<f64>,
}

/// Which query a listing request runs.
#[derive(Debug, PartialEq)]
pub enum ReadingFilter {
    TimeRange {
        earliest: Option<NaiveDateTime>,
        latest: Option<NaiveDateTime>,
    },
    SensorRange {
        column: SensorColumn,
        lowest: Option<f64>,
        highest: Option<f64>,
    },
    Recent {
        skip: u64,
        limit: u64,
    },
}

impl ListParams {
    /// Time bounds win over `sort_by`; with neither, the newest page.
    pub fn into_filter(self) -> Result<ReadingFilter, AppError> {
        if self.earliest.is_some() || self.latest.is_some() {
            return Ok(ReadingFilter::TimeRange {
                earliest: self.earliest,
                latest: self.latest,
            });
        }
        if let Some(sort_by) = self.sort_by.as_deref().filter(|s| !s.is_empty()) {
            return Ok(ReadingFilter::SensorRange {
                column: sort_by.parse()?,
                lowest: self.lowest,
                highest: self.highest,
            });
        }
        Ok(ReadingFilter::Recent {
            skip: self.skip,
            limit: self.limit,
        })
    }
}

pub async fn list(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Reading>>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let readings = match params.into_filter()? {
        ReadingFilter::TimeRange { earliest, latest } => {
            state.store.list_by_time_range(earliest, latest).await?
        }
        ReadingFilter::SensorRange {
            column,
            lowest,
            highest,
        } => state.store.list_by_sensor_range(column, lowest, highest).await?,
        ReadingFilter::Recent { skip, limit } => state.store.list_recent(skip, Some(limit)).await?,
    };
    if readings.is_empty() {
        return Err(AppError::NotFound("no readings match the query".into()));
    }
    Ok(Json(readings))
}

/// Key is checked before the body is looked at, so an unauthorized request never reaches the store.
pub async fn insert(
    State(state): State<AppState>,
    api_key: ApiKey,
    body: Result<Json<Reading>, JsonRejection>,
) -> Result<Json<Reading>, AppError> {
    api_key.verify(state.api_key.as_deref())?;
    let Json(reading) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let stored = state.store.insert(&reading).await?;
    tracing::info!(timestamp = %stored.timestamp, "reading stored");
    Ok(Json(stored))
}
