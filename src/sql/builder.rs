//! Builds parameterized INSERT and SELECT statements for the readings table.
//!
//! Every SELECT projects the fixed column list `"timestamp", "temperature", "humidity"`
//! in that order; rows are mapped back to `Reading` by position.

use super::params::PgBindValue;
use crate::error::ConfigError;
use crate::reading::{Reading, SensorColumn};
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Projection order. Row-to-record mapping depends on it.
pub const READING_COLUMNS: [&str; 3] = [TIMESTAMP_COLUMN, "temperature", "humidity"];

/// Quote identifier for PostgreSQL.
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn projection() -> String {
    READING_COLUMNS
        .iter()
        .map(|c| quoted(c))
        .collect::<Vec<_>>()
        .join(", ")
}

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]{0,62}\.)?[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("identifier pattern")
});

/// Validated table identifier, optionally schema-qualified (`schema.table`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        if !IDENTIFIER.is_match(s) {
            return Err(ConfigError::InvalidIdentifier(s.to_string()));
        }
        Ok(match s.split_once('.') {
            Some((schema, table)) => TableName {
                schema: Some(schema.to_string()),
                table: table.to_string(),
            },
            None => TableName {
                schema: None,
                table: s.to_string(),
            },
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Quoted, qualified form for SQL text.
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quoted(schema), quoted(&self.table)),
            None => quoted(&self.table),
        }
    }
}

impl Default for TableName {
    fn default() -> Self {
        TableName {
            schema: None,
            table: "readings".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Adds a parameter and returns its placeholder.
    fn push_param(&mut self, v: PgBindValue) -> String {
        let ph = v.placeholder(self.params.len() + 1);
        self.params.push(v);
        ph
    }
}

/// INSERT of the reading's present fields. Absent sensor values are left out of the column list.
pub fn insert(table: &TableName, reading: &Reading) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = vec![quoted(TIMESTAMP_COLUMN)];
    let mut placeholders = vec![q.push_param(PgBindValue::timestamp(reading.timestamp))];
    for column in SensorColumn::ALL {
        if let Some(v) = column.value_of(reading) {
            cols.push(quoted(column.column_name()));
            placeholders.push(q.push_param(PgBindValue::sensor(v)));
        }
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.qualified(),
        cols.join(", "),
        placeholders.join(", ")
    );
    q
}

/// Newest first. `skip > 0` uses OFFSET/FETCH, otherwise a plain LIMIT. A zero limit is no cap.
pub fn select_recent(table: &TableName, skip: u64, limit: Option<u64>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let limit = limit.filter(|n| *n > 0);
    let mut sql = format!(
        "SELECT {} FROM {} ORDER BY {} DESC",
        projection(),
        table.qualified(),
        quoted(TIMESTAMP_COLUMN)
    );
    if skip > 0 {
        let ph = q.push_param(PgBindValue::I64(to_i64(skip)));
        sql.push_str(&format!(" OFFSET {} ROWS", ph));
        if let Some(n) = limit {
            let ph = q.push_param(PgBindValue::I64(to_i64(n)));
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", ph));
        }
    } else if let Some(n) = limit {
        let ph = q.push_param(PgBindValue::I64(to_i64(n)));
        sql.push_str(&format!(" LIMIT {}", ph));
    }
    q.sql = sql;
    q
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Half-open range filter `[lower, upper)` on one column, newest first.
fn select_range(
    table: &TableName,
    column: &str,
    lower: Option<PgBindValue>,
    upper: Option<PgBindValue>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let column = quoted(column);
    let mut sql = format!("SELECT {} FROM {}", projection(), table.qualified());
    if lower.is_some() || upper.is_some() {
        sql.push_str(" WHERE");
    }
    let both = lower.is_some() && upper.is_some();
    if let Some(v) = lower {
        let ph = q.push_param(v);
        sql.push_str(&format!(" {} >= {}", column, ph));
    }
    if both {
        sql.push_str(" AND");
    }
    if let Some(v) = upper {
        let ph = q.push_param(v);
        sql.push_str(&format!(" {} < {}", column, ph));
    }
    sql.push_str(&format!(" ORDER BY {} DESC", quoted(TIMESTAMP_COLUMN)));
    q.sql = sql;
    q
}

pub fn select_by_time_range(
    table: &TableName,
    earliest: Option<NaiveDateTime>,
    latest: Option<NaiveDateTime>,
) -> QueryBuf {
    select_range(
        table,
        TIMESTAMP_COLUMN,
        earliest.map(PgBindValue::timestamp_bound),
        latest.map(PgBindValue::timestamp_bound),
    )
}

pub fn select_by_sensor_range(
    table: &TableName,
    column: SensorColumn,
    lowest: Option<f64>,
    highest: Option<f64>,
) -> QueryBuf {
    select_range(
        table,
        column.column_name(),
        lowest.map(PgBindValue::F64),
        highest.map(PgBindValue::F64),
    )
}

/// DDL for the readings table. Column order is the contract documented on this module.
pub fn create_table(table: &TableName) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
            id BIGSERIAL PRIMARY KEY, \
            \"timestamp\" TIMESTAMP NOT NULL UNIQUE, \
            temperature DOUBLE PRECISION, \
            humidity DOUBLE PRECISION\
        )",
        table.qualified()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    const SELECT: &str = r#"SELECT "timestamp", "temperature", "humidity" FROM "readings""#;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 20).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn table_name_accepts_plain_and_qualified_identifiers() {
        assert_eq!(TableName::parse("readings").unwrap().qualified(), r#""readings""#);
        let t = TableName::parse("sensors.messdaten").unwrap();
        assert_eq!(t.schema(), Some("sensors"));
        assert_eq!(t.table(), "messdaten");
        assert_eq!(t.qualified(), r#""sensors"."messdaten""#);
    }

    #[test]
    fn table_name_rejects_anything_else() {
        for bad in ["", "1readings", "readings; DROP TABLE x", "a.b.c", "read-ings", "\"readings\""] {
            assert!(TableName::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn insert_lists_only_present_fields() {
        let table = TableName::default();
        let full = insert(&table, &Reading::new(at(12, 25, 0), Some(25.7123), Some(41.08)));
        assert_eq!(
            full.sql,
            r#"INSERT INTO "readings" ("timestamp", "temperature", "humidity") VALUES ($1::timestamp, $2, $3)"#
        );
        assert_eq!(
            full.params,
            vec![
                PgBindValue::Timestamp("2025-08-20 12:25:00".into()),
                PgBindValue::F64(25.7),
                PgBindValue::F64(41.1),
            ]
        );

        let partial = insert(&table, &Reading::new(at(12, 25, 0), None, Some(40.0)));
        assert_eq!(
            partial.sql,
            r#"INSERT INTO "readings" ("timestamp", "humidity") VALUES ($1::timestamp, $2)"#
        );
        assert_eq!(partial.params.len(), 2);
    }

    #[test]
    fn recent_without_skip_is_a_plain_limit() {
        let q = select_recent(&TableName::default(), 0, Some(10));
        assert_eq!(q.sql, format!(r#"{} ORDER BY "timestamp" DESC LIMIT $1"#, SELECT));
        assert_eq!(q.params, vec![PgBindValue::I64(10)]);
    }

    #[test]
    fn recent_with_skip_uses_offset_fetch() {
        let q = select_recent(&TableName::default(), 5, Some(10));
        assert_eq!(
            q.sql,
            format!(r#"{} ORDER BY "timestamp" DESC OFFSET $1 ROWS FETCH NEXT $2 ROWS ONLY"#, SELECT)
        );
        assert_eq!(q.params, vec![PgBindValue::I64(5), PgBindValue::I64(10)]);

        let q = select_recent(&TableName::default(), 5, None);
        assert_eq!(q.sql, format!(r#"{} ORDER BY "timestamp" DESC OFFSET $1 ROWS"#, SELECT));
    }

    #[test]
    fn recent_with_zero_limit_is_uncapped() {
        let q = select_recent(&TableName::default(), 0, Some(0));
        assert_eq!(q.sql, format!(r#"{} ORDER BY "timestamp" DESC"#, SELECT));
        assert!(q.params.is_empty());
    }

    #[test]
    fn time_range_is_half_open() {
        let q = select_by_time_range(&TableName::default(), Some(at(12, 0, 0)), Some(at(13, 0, 0)));
        assert_eq!(
            q.sql,
            format!(
                r#"{} WHERE "timestamp" >= $1::timestamp AND "timestamp" < $2::timestamp ORDER BY "timestamp" DESC"#,
                SELECT
            )
        );
        assert_eq!(
            q.params,
            vec![
                PgBindValue::Timestamp("2025-08-20 12:00:00".into()),
                PgBindValue::Timestamp("2025-08-20 13:00:00".into()),
            ]
        );
    }

    #[test]
    fn time_range_bounds_keep_fractional_seconds() {
        let half_past = at(12, 0, 0).with_nanosecond(500_000_000).unwrap();
        let q = select_by_time_range(&TableName::default(), Some(half_past), Some(half_past));
        assert_eq!(
            q.params,
            vec![
                PgBindValue::Timestamp("2025-08-20 12:00:00.500".into()),
                PgBindValue::Timestamp("2025-08-20 12:00:00.500".into()),
            ]
        );
    }

    #[test]
    fn range_with_a_single_bound_has_no_and() {
        let table = TableName::default();
        let lower = select_by_time_range(&table, Some(at(12, 0, 0)), None);
        assert_eq!(
            lower.sql,
            format!(r#"{} WHERE "timestamp" >= $1::timestamp ORDER BY "timestamp" DESC"#, SELECT)
        );
        let upper = select_by_sensor_range(&table, SensorColumn::Humidity, None, Some(50.0));
        assert_eq!(
            upper.sql,
            format!(r#"{} WHERE "humidity" < $1 ORDER BY "timestamp" DESC"#, SELECT)
        );
        assert_eq!(upper.params, vec![PgBindValue::F64(50.0)]);
    }

    #[test]
    fn range_without_bounds_selects_everything() {
        let q = select_by_time_range(&TableName::default(), None, None);
        assert_eq!(q.sql, format!(r#"{} ORDER BY "timestamp" DESC"#, SELECT));
        assert!(q.params.is_empty());
    }

    #[test]
    fn zero_is_a_real_sensor_bound() {
        let q = select_by_sensor_range(&TableName::default(), SensorColumn::Temperature, Some(0.0), Some(20.0));
        assert_eq!(
            q.sql,
            format!(
                r#"{} WHERE "temperature" >= $1 AND "temperature" < $2 ORDER BY "timestamp" DESC"#,
                SELECT
            )
        );
        assert_eq!(q.params, vec![PgBindValue::F64(0.0), PgBindValue::F64(20.0)]);
    }

    #[test]
    fn create_table_uses_qualified_name() {
        let ddl = create_table(&TableName::parse("sensors.readings").unwrap());
        assert!(ddl.starts_with(r#"CREATE TABLE IF NOT EXISTS "sensors"."readings" ("#));
        assert!(ddl.contains(r#""timestamp" TIMESTAMP NOT NULL UNIQUE"#));
    }
}
