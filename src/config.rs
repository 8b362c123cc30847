use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use anyhow::anyhow;
use tracing::info;

pub const DEFAULT_CORS_ORIGINS: &str =
    "https://rfid-attendance-sage.vercel.app,http://localhost:5173,http://localhost:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub pool_max_connections: usize,
    pub pool_acquire_timeout: Duration,
    pub query_limit: usize,
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let acquire_ms: u64 = try_load(&lookup, "DB_POOL_ACQUIRE_TIMEOUT_MS", "10000")?;
        let pool_max_connections: usize = try_load(&lookup, "DB_POOL_MAX", "20")?;
        if pool_max_connections == 0 {
            return Err(anyhow!("DB_POOL_MAX must be at least 1"));
        }
        let query_limit: usize = try_load(&lookup, "ATTENDANCE_QUERY_LIMIT", "100")?;
        if query_limit == 0 {
            return Err(anyhow!("ATTENDANCE_QUERY_LIMIT must be at least 1"));
        }
        let origins: String = try_load(&lookup, "CORS_ORIGINS", DEFAULT_CORS_ORIGINS)?;

        Ok(Self {
            bind_addr: try_load(&lookup, "BIND_ADDR", "0.0.0.0")?,
            port: try_load(&lookup, "PORT", "3000")?,
            database_path: try_load(&lookup, "DATABASE_PATH", "attendance.sqlite3")?,
            pool_max_connections,
            pool_acquire_timeout: Duration::from_millis(acquire_ms),
            query_limit,
            cors_origins: origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        })
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.trim()
        .parse()
        .map_err(|e| anyhow!("invalid {key} value {raw:?}: {e}"))
}
