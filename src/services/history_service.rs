//! History Service
//!
//! Loads OHLCV bars into `f_ohlcv`. Timestamps carrying a UTC offset are
//! converted to the market timezone; naive timestamps are taken as
//! market-local wall time.

use crate::db::duckdb::models::OhlcvRow;
use crate::error::{AppError, Result};
use crate::state::AppState;
use chrono::{DateTime, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// One bar as received from a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleData {
    pub ts_event: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: i64,
    #[serde(default)]
    pub instrument_id: Option<i64>,
    pub symbol: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct IngestResult {
    pub inserted: usize,
}

/// History service for business logic
pub struct HistoryService;

impl HistoryService {
    /// Validate, normalize and upsert bars, then drop cached results
    pub fn store_bars(state: &AppState, candles: &[CandleData]) -> Result<IngestResult> {
        if candles.is_empty() {
            return Err(AppError::Validation("No bars to store".to_string()));
        }

        let tz = state.settings()?.timezone()?;
        let rows = candles
            .iter()
            .enumerate()
            .map(|(i, c)| to_row(c, tz).map_err(|e| row_error(i, e)))
            .collect::<Result<Vec<_>>>()?;

        let inserted = state.duckdb.insert_bars(&rows)?;
        state.cache.clear();

        info!("HistoryService::store_bars - stored {} bars", inserted);

        Ok(IngestResult { inserted })
    }
}

fn row_error(index: usize, err: AppError) -> AppError {
    match err {
        AppError::Validation(msg) => AppError::Validation(format!("bar {}: {}", index, msg)),
        other => other,
    }
}

fn to_row(candle: &CandleData, tz: Tz) -> Result<OhlcvRow> {
    let symbol = candle.symbol.trim();
    if symbol.is_empty() {
        return Err(AppError::Validation("symbol is required".to_string()));
    }
    let prices = [candle.open, candle.high, candle.low, candle.close];
    if prices.iter().any(|p| !p.is_finite()) {
        return Err(AppError::Validation("prices must be finite".to_string()));
    }
    if candle.high < candle.low {
        return Err(AppError::Validation(format!(
            "high {} is below low {}",
            candle.high, candle.low
        )));
    }

    let ts_event = parse_event_time(&candle.ts_event, tz)?;
    let category = candle
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let mut row = OhlcvRow::new(
        ts_event,
        symbol,
        category,
        candle.open,
        candle.high,
        candle.low,
        candle.close,
        candle.volume,
    );
    row.instrument_id = candle.instrument_id;
    Ok(row)
}

/// Market-local wall time for an ingest timestamp
pub fn parse_event_time(value: &str, tz: Tz) -> Result<NaiveDateTime> {
    let value = value.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(value) {
        return Ok(with_offset.with_timezone(&tz).naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|ts| ts.with_nanosecond(0).unwrap_or(ts))
        .ok_or_else(|| AppError::Validation(format!("unrecognized timestamp '{}'", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::duckdb::tests::d;

    fn candle(ts: &str, symbol: &str) -> CandleData {
        CandleData {
            ts_event: ts.to_string(),
            open: 1.0,
            high: 1.2,
            low: 0.9,
            close: 1.1,
            volume: 10,
            instrument_id: Some(42),
            symbol: symbol.to_string(),
            category: Some("6E".to_string()),
        }
    }

    #[test]
    fn test_parse_offset_timestamp_to_market_time() {
        let tz: Tz = "US/Eastern".parse().unwrap();
        // 14:30 UTC is 09:30 EST in January
        let ts = parse_event_time("2024-01-02T14:30:00Z", tz).unwrap();
        assert_eq!(ts, d(2).and_hms_opt(9, 30, 0).unwrap());

        // 13:30 UTC is 09:30 EDT in July
        let ts = parse_event_time("2024-07-02T13:30:00+00:00", tz).unwrap();
        assert_eq!(ts.format("%H:%M").to_string(), "09:30");
    }

    #[test]
    fn test_parse_naive_timestamp_is_kept() {
        let tz: Tz = "US/Eastern".parse().unwrap();
        let ts = parse_event_time("2024-01-02 18:05:00", tz).unwrap();
        assert_eq!(ts, d(2).and_hms_opt(18, 5, 0).unwrap());
        let ts = parse_event_time("2024-01-02T18:05:00.250", tz).unwrap();
        assert_eq!(ts, d(2).and_hms_opt(18, 5, 0).unwrap());
        assert!(parse_event_time("yesterday", tz).is_err());
    }

    #[test]
    fn test_store_bars_derives_hour_and_clears_cache() {
        let state = AppState::in_memory().unwrap();
        state.cache.insert("stale".to_string(), 1i32);

        let result = HistoryService::store_bars(
            &state,
            &[
                candle("2024-01-02T14:30:00Z", "6EH4"),
                candle("2024-01-02 10:00:00", "6EH4"),
            ],
        )
        .unwrap();
        assert_eq!(result.inserted, 2);
        assert!(state.cache.is_empty());

        let bars = state.duckdb.query_bars("6E", "6EH4", None, None).unwrap();
        assert_eq!((bars[0].hour, bars[0].minute), (9, 30));
        assert_eq!(bars[0].instrument_id, Some(42));
        assert_eq!((bars[1].hour, bars[1].minute), (10, 0));
    }

    #[test]
    fn test_store_bars_rejects_bad_rows() {
        let state = AppState::in_memory().unwrap();
        assert!(HistoryService::store_bars(&state, &[]).is_err());

        let mut inverted = candle("2024-01-02 10:00:00", "6EH4");
        inverted.high = 0.5;
        let err = HistoryService::store_bars(&state, &[inverted]).unwrap_err();
        assert!(err.to_string().contains("bar 0"));

        let err = HistoryService::store_bars(&state, &[candle("2024-01-02 10:00", " ")]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
