//! Settings loaded once at startup from the environment (and `.env` via dotenvy in the binary).

use crate::error::ConfigError;
use crate::sql::TableName;
use sqlx::postgres::PgConnectOptions;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024;

#[derive(Clone)]
pub struct DatabaseSettings {
    pub connect: PgConnectOptions,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub table: TableName,
    /// Create the database and readings table on startup.
    pub ensure_schema: bool,
}

#[derive(Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub bind_addr: SocketAddr,
    /// Shared secret for writes. `None` rejects every write.
    pub api_key: Option<String>,
    /// Allowed CORS origins. Empty means no cross-origin access.
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let connect = match get("DATABASE_URL") {
            Some(url) => PgConnectOptions::from_str(&url).map_err(|e| ConfigError::Invalid {
                var: "DATABASE_URL",
                value: "<redacted>".into(),
                reason: e.to_string(),
            })?,
            None => {
                let mut opts = PgConnectOptions::new()
                    .host(get("DB_HOST").as_deref().unwrap_or(DEFAULT_DB_HOST))
                    .port(parse_or("DB_PORT", get("DB_PORT"), DEFAULT_DB_PORT)?);
                if let Some(user) = get("DB_USER") {
                    opts = opts.username(&user);
                }
                if let Some(password) = get("DB_PWD") {
                    opts = opts.password(&password);
                }
                let name = get("DB_NAME").ok_or(ConfigError::Missing("DB_NAME or DATABASE_URL"))?;
                opts.database(&name)
            }
        };

        let table = match get("READINGS_TABLE") {
            Some(name) => TableName::parse(&name)?,
            None => TableName::default(),
        };

        let database = DatabaseSettings {
            connect,
            max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), DEFAULT_MAX_CONNECTIONS)?,
            acquire_timeout: Duration::from_secs(parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                get("DB_ACQUIRE_TIMEOUT_SECS"),
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?),
            table,
            ensure_schema: parse_bool("ENSURE_SCHEMA", get("ENSURE_SCHEMA"))?,
        };

        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "BIND_ADDR",
            value: bind_addr.clone(),
            reason: e.to_string(),
        })?;

        Ok(Settings {
            database,
            bind_addr,
            api_key: get("API_KEY"),
            cors_origins: get("ORIGINS").map(|s| split_list(&s)).unwrap_or_default(),
            request_timeout: Duration::from_secs(parse_or(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            max_body_bytes: parse_or("MAX_BODY_BYTES", get("MAX_BODY_BYTES"), DEFAULT_MAX_BODY_BYTES)?,
        })
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_bool(var: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            var,
            value: raw.unwrap_or_default(),
            reason: "expected true or false".into(),
        }),
    }
}

/// Comma-separated list, also tolerating a JSON-style `["a", "b"]`.
fn split_list(s: &str) -> Vec<String> {
    s.trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|item| item.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
