//! Server configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use bloodlink_database::db::DEFAULT_DATABASE_URL;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Default period between facility catalog reloads, in seconds.
pub const DEFAULT_RELOAD_SECS: u64 = 30;

/// Runtime settings for [`crate::run_server`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `PostgreSQL` connection string for the donor store.
    pub database_url: String,
    /// Listen address.
    pub bind_addr: String,
    /// Listen port.
    pub port: u16,
    /// Directory holding `bloodbanks.json` and `hospitals.json`.
    pub data_dir: PathBuf,
    /// Period of the background catalog reload. `None` disables it.
    pub reload_interval: Option<Duration>,
    /// Single allowed browser origin. `None` allows any origin.
    pub cors_origin: Option<String>,
}

impl ServerConfig {
    /// Reads `DATABASE_URL`, `BIND_ADDR`, `PORT`, `BLOODLINK_DATA_DIR`,
    /// `FACILITY_RELOAD_SECS`, and `CORS_ORIGIN`.
    ///
    /// Unset or unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = var("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let reload_secs = var("FACILITY_RELOAD_SECS")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_RELOAD_SECS);

        Self {
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            data_dir: var("BLOODLINK_DATA_DIR").map_or_else(|| PathBuf::from("data"), PathBuf::from),
            reload_interval: (reload_secs > 0).then(|| Duration::from_secs(reload_secs)),
            cors_origin: var("CORS_ORIGIN"),
        }
    }
}
