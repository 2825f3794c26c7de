//! Services Layer
//!
//! Business logic called by the REST API handlers. Services are stateless
//! unit structs; every call takes the shared [`AppState`](crate::state::AppState)
//! and is blocking, so handlers run them on the blocking pool.
//!
//! # Architecture
//!
//! ```text
//! REST API --> Services ──┬──> DuckDB (f_ohlcv)
//!                         ├──> analysis (zones, buckets, sessions)
//!                         └──> SQLite (settings)
//! ```
//!
//! # Services
//!
//! - `CatalogService` - Categories, symbols, date range, raw bars
//! - `ZoneService` - Day selection and zone classification
//! - `RetracementService` - Midnight-open and Zone 1 retracement buckets
//! - `DayStatsService` - High/low of day in the open and through the day
//! - `DirectionService` - Bullish/bearish opening candles
//! - `SessionService` - Asia / London / New York opening windows
//! - `DashboardService` - The full pipeline plus summary cards
//! - `HistoryService` - Bar ingest
//! - `SettingsService` - Runtime settings

pub mod catalog_service;
pub mod dashboard_service;
pub mod day_stats_service;
pub mod direction_service;
pub mod history_service;
pub mod retracement_service;
pub mod session_service;
pub mod settings_service;
pub mod zone_service;

// Re-export commonly used types and services
pub use catalog_service::{BarsQuery, CatalogService, DateRange};
pub use dashboard_service::{DashboardResult, DashboardService, SummaryCards};
pub use day_stats_service::{DayStats, DayStatsService, OpenProbability};
pub use direction_service::{DayType, DirectionService, DirectionStats};
pub use history_service::{CandleData, HistoryService, IngestResult};
pub use retracement_service::{RetracementService, RetracementStats};
pub use session_service::{SessionRequest, SessionResult, SessionService};
pub use settings_service::SettingsService;
pub use zone_service::{ClassifiedDay, ClassifyRequest, DayFilter, Selection, ZoneService};
