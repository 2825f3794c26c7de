//! Catalog Service
//!
//! What is in the store: categories, symbols, the covered date range, and
//! the raw bars of one contract.

use crate::cache::QueryCache;
use crate::db::duckdb::models::OhlcvRow;
use crate::error::{AppError, Result};
use crate::state::AppState;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Bars of one category / symbol, optionally bounded by day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarsQuery {
    pub category: String,
    pub symbol: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl BarsQuery {
    pub fn validate(&self) -> Result<()> {
        if self.category.trim().is_empty() || self.symbol.trim().is_empty() {
            return Err(AppError::Validation(
                "category and symbol are required".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(AppError::Validation(
                    "Start date must be before or equal to the end date".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Catalog service for business logic
pub struct CatalogService;

impl CatalogService {
    pub fn categories(state: &AppState) -> Result<Vec<String>> {
        let ttl = state.settings()?.cache_ttl();
        state
            .cache
            .get_or_try_insert("categories".to_string(), ttl, || state.duckdb.categories())
    }

    pub fn symbols(state: &AppState, category: Option<&str>) -> Result<Vec<String>> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let ttl = state.settings()?.cache_ttl();
        state.cache.get_or_try_insert(
            QueryCache::key("symbols", &category),
            ttl,
            || state.duckdb.symbols(category),
        )
    }

    /// Covered days; `NotFound` when the store is empty
    pub fn date_range(state: &AppState) -> Result<DateRange> {
        let ttl = state.settings()?.cache_ttl();
        let range = state
            .cache
            .get_or_try_insert("date_range".to_string(), ttl, || state.duckdb.date_range())?;

        range
            .map(|(start, end)| DateRange { start, end })
            .ok_or_else(|| AppError::NotFound("No OHLCV data loaded".to_string()))
    }

    pub fn load_bars(state: &AppState, query: &BarsQuery) -> Result<Vec<OhlcvRow>> {
        query.validate()?;

        info!(
            "CatalogService::load_bars - {} {} {:?} to {:?}",
            query.category, query.symbol, query.start_date, query.end_date
        );

        state.duckdb.query_bars(
            query.category.trim(),
            query.symbol.trim(),
            query.start_date,
            query.end_date,
        )
    }
}
