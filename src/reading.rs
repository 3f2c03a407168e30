//! The `Reading` record, sensor-column allow-list, and value normalization.

use chrono::{DateTime, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp format in JSON responses.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Timestamp format written to the store.
pub const SQL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One sensor sample. `timestamp` is unique per row and the sort key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(alias = "datetime", with = "timestamp")]
    pub timestamp: NaiveDateTime,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, temperature: Option<f64>, humidity: Option<f64>) -> Self {
        Reading {
            timestamp,
            temperature,
            humidity,
        }
    }

    /// The reading as the store keeps it: whole seconds, one decimal place.
    pub fn normalized(&self) -> Self {
        Reading {
            timestamp: truncate_seconds(self.timestamp),
            temperature: self.temperature.map(round_one_decimal),
            humidity: self.humidity.map(round_one_decimal),
        }
    }
}

/// Rounds half away from zero to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    let scaled = value * 10.0;
    // Overflows near f64::MAX; values that large have no decimal digits.
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 10.0
}

pub fn truncate_seconds(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Accepts `YYYY-MM-DDTHH:MM:SS`, a space instead of `T`, optional fractional
/// seconds, or RFC 3339 with an offset (converted to UTC).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// Serde adapters for reading timestamps.
pub mod timestamp {
    use super::{parse_timestamp, TIMESTAMP_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&ts.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub fn deserialize_option<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw))),
        }
    }
}

/// Sensor columns a client may filter on. The only identifiers ever taken from a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorColumn {
    Temperature,
    Humidity,
}

impl SensorColumn {
    pub const ALL: [SensorColumn; 2] = [SensorColumn::Temperature, SensorColumn::Humidity];

    pub fn column_name(self) -> &'static str {
        match self {
            SensorColumn::Temperature => "temperature",
            SensorColumn::Humidity => "humidity",
        }
    }

    /// Value of this sensor in a reading.
    pub fn value_of(self, reading: &Reading) -> Option<f64> {
        match self {
            SensorColumn::Temperature => reading.temperature,
            SensorColumn::Humidity => reading.humidity,
        }
    }
}

impl fmt::Display for SensorColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for SensorColumn {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorColumn::ALL
            .into_iter()
            .find(|c| c.column_name() == s)
            .ok_or_else(|| {
                crate::error::AppError::BadRequest(format!(
                    "unknown sensor column: {} (expected temperature or humidity)",
                    s
                ))
            })
    }
}
