use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::report::ProjectScope;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 25;
const DEFAULT_SWEEP_SECS: u64 = 300;
const DEFAULT_ROSTER_PATH: &str = "data/daftar_pengguna_serumpun.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value } => write!(f, "invalid {key}: {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub scope: ProjectScope,
    pub host: String,
    pub port: u16,
    pub cache_ttl: Duration,
    pub query_timeout: Duration,
    pub roster_path: PathBuf,
    pub queries_dir: Option<PathBuf>,
    /// `None` disables the background cache sweeper.
    pub sweep_interval: Option<Duration>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_kv(&std::env::vars().collect())
    }

    pub fn from_kv(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let required = |key: &'static str| {
            get(key)
                .map(str::to_string)
                .ok_or(ConfigError::Missing(key))
        };

        let port = match get("APP_PORT") {
            Some(v) => v.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "APP_PORT",
                value: v.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let sweep_secs = seconds_or_default(get("CACHE_SWEEP_SECONDS"), "CACHE_SWEEP_SECONDS", DEFAULT_SWEEP_SECS, true);

        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            scope: ProjectScope {
                workspace_id: required("WORKSPACE_ID")?,
                project_id: required("PROJECT_ID")?,
            },
            host: get("APP_HOST").unwrap_or(DEFAULT_HOST).to_string(),
            port,
            cache_ttl: Duration::from_secs(seconds_or_default(
                get("CACHE_TTL_SECONDS"),
                "CACHE_TTL_SECONDS",
                DEFAULT_CACHE_TTL_SECS,
                false,
            )),
            query_timeout: Duration::from_secs(seconds_or_default(
                get("QUERY_TIMEOUT_SECONDS"),
                "QUERY_TIMEOUT_SECONDS",
                DEFAULT_QUERY_TIMEOUT_SECS,
                false,
            )),
            roster_path: PathBuf::from(get("ROSTER_CSV_PATH").unwrap_or(DEFAULT_ROSTER_PATH)),
            queries_dir: get("QUERIES_DIR").map(PathBuf::from),
            sweep_interval: (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs)),
        })
    }
}

/// Parse a whole number of seconds. Unparsable values, and zero unless
/// `allow_zero`, fall back to `default` with a warning.
fn seconds_or_default(raw: Option<&str>, key: &str, default: u64, allow_zero: bool) -> u64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<i64>() {
        Ok(n) if n > 0 || (allow_zero && n == 0) => n as u64,
        _ => {
            log::warn!("{key}={raw:?} is not a valid duration, using {default}s");
            default
        }
    }
}
