//! Bootstrap configuration from environment variables
//!
//! Only what is needed before the settings store can be opened lives here.
//! Everything else is a runtime setting in SQLite.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// DuckDB file holding `f_ohlcv`; may point at an existing database
    pub duckdb_path: PathBuf,
    pub sqlite_path: PathBuf,
    /// Override for the stored server host
    pub host: Option<String>,
    /// Override for the stored server port
    pub port: Option<u16>,
}

fn env_str(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_u16_opt(name: &str) -> Option<u16> {
    env_opt(name).and_then(|s| s.parse().ok())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = PathBuf::from(env_str("ZONE_DASHBOARD_DATA_DIR", "./data"));
        Self::with_data_dir(data_dir)
    }

    fn with_data_dir(data_dir: PathBuf) -> Self {
        let duckdb_path = env_opt("ZONE_DASHBOARD_DUCKDB")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("ohlcv.duckdb"));
        let sqlite_path = data_dir.join("settings.db");

        Self {
            data_dir,
            duckdb_path,
            sqlite_path,
            host: env_opt("ZONE_DASHBOARD_HOST"),
            port: env_u16_opt("ZONE_DASHBOARD_PORT"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_data_dir() {
        let config = AppConfig::with_data_dir(PathBuf::from("/tmp/zd"));
        assert_eq!(config.sqlite_path, PathBuf::from("/tmp/zd/settings.db"));
        if env::var("ZONE_DASHBOARD_DUCKDB").is_err() {
            assert_eq!(config.duckdb_path, PathBuf::from("/tmp/zd/ohlcv.duckdb"));
        }
    }
}
