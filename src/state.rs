//! Application state management

use crate::cache::QueryCache;
use crate::config::AppConfig;
use crate::db::duckdb::DuckDb;
use crate::db::sqlite::{DashboardSettings, SqliteDb};
use crate::error::Result;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// SQLite database holding the dashboard settings
    pub sqlite: Arc<SqliteDb>,

    /// DuckDB connection holding `f_ohlcv`
    pub duckdb: Arc<DuckDb>,

    /// Computed results, keyed by endpoint and request
    pub cache: QueryCache,

    pub config: AppConfig,
}

impl AppState {
    /// Create new application state
    pub fn new(config: AppConfig) -> Result<Self> {
        // Create data directory if it doesn't exist
        std::fs::create_dir_all(&config.data_dir)?;
        if let Some(parent) = config.duckdb_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!("Data directory: {:?}", config.data_dir);

        // Initialize SQLite database
        let sqlite = Arc::new(SqliteDb::new(&config.sqlite_path)?);

        // Initialize DuckDB
        tracing::info!("OHLCV database: {:?}", config.duckdb_path);
        let duckdb = Arc::new(DuckDb::new(&config.duckdb_path)?);

        Ok(Self {
            sqlite,
            duckdb,
            cache: QueryCache::new(),
            config,
        })
    }

    /// State backed by in-memory databases
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            sqlite: Arc::new(SqliteDb::in_memory()?),
            duckdb: Arc::new(DuckDb::in_memory()?),
            cache: QueryCache::new(),
            config: AppConfig::from_env(),
        })
    }

    pub fn settings(&self) -> Result<DashboardSettings> {
        self.sqlite.get_settings()
    }
}
